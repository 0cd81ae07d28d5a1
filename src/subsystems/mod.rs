mod cart_sync;
mod web_server;

pub use cart_sync::CartSync;
pub use web_server::WebServer;
