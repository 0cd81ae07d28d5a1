mod begin_payment;
mod checkout_view;
pub(crate) mod draft;
mod errors;
mod go_back;
mod ids;
mod payment_callback;
mod start_checkout;
mod state;
mod submit_shipping;

pub use begin_payment::{
    BeginPaymentCommand, FailPaymentAttemptCommand, OpenPaymentAttemptCommand, PaymentOpened,
    begin_payment_endpoint,
};
pub use checkout_view::{
    AttemptView, CheckoutView, checkout_view_endpoint, checkout_view_read_model, load_checkout,
};
pub use draft::{Contact, PaymentDetails, ShippingDetails};
pub use errors::CheckoutError;
pub use go_back::{GoBackCommand, go_back_endpoint};
pub use ids::{AttemptId, CheckoutId};
pub use payment_callback::{
    ConfirmPaymentCommand, DismissPaymentCommand, PaymentCallbackPayload, payment_callback_endpoint,
};
pub use start_checkout::{
    StartCheckoutCommand, StartCheckoutPayload, StartCheckoutResponse, start_checkout_endpoint,
};
pub use state::{AttemptProgress, CheckoutProgress, CheckoutStep, Destination};
pub use submit_shipping::{
    ResolvedAddress, ShippingAccepted, SubmitShippingCommand, resolve_address,
    submit_shipping_endpoint,
};
