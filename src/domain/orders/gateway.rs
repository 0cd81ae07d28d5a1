//! The seam to the external payment gateway.

use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GatewayOrderRequest {
    /// Amount in the smallest currency unit.
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub order_id: String,
    pub amount: i64,
    pub status: String,
}

impl GatewayPayment {
    /// True once the gateway holds the customer's money.
    pub fn is_successful(&self) -> bool {
        matches!(self.status.as_str(), "authorized" | "captured")
    }
}

/// Gateway ids are ASCII letters, digits and underscores, like `pay_29QQoUBi66xm2f`.
pub fn is_gateway_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Payment gateway could not be reached: {0}")]
    Unavailable(String),
    #[error("Payment gateway rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("Payment gateway sent an unexpected response: {0}")]
    InvalidResponse(String),
    #[error("{0:?} is not a gateway id.")]
    InvalidId(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &GatewayOrderRequest) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

//-------------------------- Tests -------------------------------
