mod errors;
mod gateway;
mod order_history;
mod records;
mod repository;
mod writer;

pub use errors::OrderError;
pub use gateway::{
    GatewayError, GatewayOrder, GatewayOrderRequest, GatewayPayment, PaymentGateway,
    is_gateway_id,
};
pub use order_history::{order_endpoint, user_orders_endpoint};
pub use records::{
    NewOrder, NewPayment, Order, OrderId, OrderLine, OrderStatus, PaymentId, PaymentStatus,
};
pub use repository::{OrderRepository, PgOrderRepository};
pub use writer::{GatewayHandoff, OrderRecordWriter, PaymentRequest, Prefill};
