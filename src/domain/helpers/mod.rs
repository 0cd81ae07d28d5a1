pub mod fake;
pub mod live_read_models;
mod macros;

pub use macros::UuidNotCompatible;
