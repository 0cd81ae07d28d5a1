use super::{GatewayError, OrderId};

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("A shipping address is required before placing an order.")]
    MissingAddress,
    #[error("Cannot place an order for an empty cart.")]
    EmptyCart,
    #[error("Order total must be a positive amount.")]
    InvalidAmount,
    #[error("The order could not be saved. Please try again.")]
    Persistence(#[source] anyhow::Error),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("The payment could not be confirmed.")]
    PaymentNotConfirmed,
    #[error("Order {0} does not exist.")]
    OrderNotFound(OrderId),
}
