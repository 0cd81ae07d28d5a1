use jiff::Timestamp;

use super::{
    addresses::{AddressId, ShippingAddress},
    cart::{CartId, UserId},
    checkout::{AttemptId, CheckoutId, Contact, Destination},
    orders::OrderId,
};

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize, disintegrate::Event)]
#[stream(CheckoutStream, [
    CheckoutExited,
    CheckoutStarted,
    PaymentAttemptDismissed,
    PaymentAttemptExpired,
    PaymentAttemptFailed,
    PaymentAttemptOpened,
    PaymentAttemptStarted,
    PaymentConfirmed,
    ReturnedToShipping,
    ShippingDetailsAccepted
])]
pub enum DomainEvent {
    CheckoutExited {
        #[id]
        checkout_id: CheckoutId,
        destination: Destination,
    },
    CheckoutStarted {
        #[id]
        checkout_id: CheckoutId,
        cart_id: CartId,
        user_id: Option<UserId>,
    },
    PaymentAttemptDismissed {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
    },
    PaymentAttemptExpired {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
    },
    PaymentAttemptFailed {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
        reason: String,
    },
    PaymentAttemptOpened {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
        order_id: OrderId,
        gateway_order_id: String,
    },
    PaymentAttemptStarted {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
        expires_at: Timestamp,
    },
    PaymentConfirmed {
        #[id]
        checkout_id: CheckoutId,
        attempt_id: AttemptId,
        order_id: OrderId,
        gateway_payment_id: String,
    },
    ReturnedToShipping {
        #[id]
        checkout_id: CheckoutId,
    },
    ShippingDetailsAccepted {
        #[id]
        checkout_id: CheckoutId,
        contact: Contact,
        address: ShippingAddress,
        address_id: Option<AddressId>,
    },
}
