mod cli;
mod client_error;
mod config;
mod razorpay;

pub use cli::Cli;
pub use client_error::ClientError;
pub use config::{
    CartSyncSettings, DatabaseSettings, PaymentSettings, ServerSettings, Settings,
    get_config_settings,
};
pub use razorpay::RazorpayClient;
