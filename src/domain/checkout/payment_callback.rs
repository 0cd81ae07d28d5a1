//! Payment Callback slice
//!
//! The gateway UI reports back through the client: either the customer paid, or they closed
//! the payment window.

use axum::{
    Json,
    extract::{Path, State},
};
use disintegrate::Decision;
use tracing::info;
use uuid::Uuid;

use crate::{
    domain::{
        DecisionMaker, DomainEvent, EventStore,
        cart::CartRegistry,
        orders::{OrderError, OrderId, OrderRecordWriter},
    },
    infra::ClientError,
};

use super::{
    AttemptId, CheckoutError, CheckoutId, CheckoutProgress, CheckoutView, begin_payment::release_attempt,
    load_checkout,
};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PaymentCallbackPayload {
    Success {
        attempt_id: Uuid,
        gateway_order_id: String,
        gateway_payment_id: String,
    },
    Dismissed {
        attempt_id: Uuid,
    },
}

pub async fn payment_callback_endpoint(
    State(decider): State<DecisionMaker>,
    State(event_store): State<EventStore>,
    State(carts): State<CartRegistry>,
    State(writer): State<OrderRecordWriter>,
    Path(checkout_uuid): Path<Uuid>,
    Json(payload): Json<PaymentCallbackPayload>,
) -> Result<Json<CheckoutView>, ClientError> {
    let checkout_id: CheckoutId = checkout_uuid.try_into()?;

    match payload {
        PaymentCallbackPayload::Success {
            attempt_id,
            gateway_order_id,
            gateway_payment_id,
        } => {
            let attempt_id: AttemptId = attempt_id.try_into()?;
            let checkout = load_checkout(&event_store, checkout_id).await?;
            if checkout.exited_to.is_some() {
                return Err(CheckoutError::CheckoutClosed(checkout_id).into());
            }
            let attempt = checkout
                .attempt
                .as_ref()
                .filter(|attempt| attempt.attempt_id == attempt_id)
                .ok_or(CheckoutError::AttemptNotCurrent(attempt_id))?;
            let order_id = attempt
                .order_id
                .ok_or(CheckoutError::AttemptNotOpened(attempt_id))?;
            if attempt.gateway_order_id.as_deref() != Some(gateway_order_id.as_str()) {
                return Err(OrderError::PaymentNotConfirmed.into());
            }

            if let Err(err) = writer
                .complete_payment(order_id, &gateway_order_id, &gateway_payment_id)
                .await
            {
                let err = ClientError::from(err);
                release_attempt(&decider, checkout_id, attempt_id, err.public_message()).await;
                return Err(err);
            }

            // Money has moved; the cart goes before the checkout is marked confirmed.
            carts.clear(checkout.cart_id).await;

            let checkout = record_confirmation(
                &decider,
                &event_store,
                ConfirmPaymentCommand {
                    checkout_id,
                    attempt_id,
                    order_id,
                    gateway_payment_id,
                },
            )
            .await?;
            info!("Checkout {checkout_id}: order {order_id} paid");
            return Ok(Json(checkout));
        }
        PaymentCallbackPayload::Dismissed { attempt_id } => {
            decider
                .make(DismissPaymentCommand {
                    checkout_id,
                    attempt_id: attempt_id.try_into()?,
                })
                .await?;
        }
    }

    Ok(Json(load_checkout(&event_store, checkout_id).await?))
}

/// Records a payment the order records already hold as completed. If the decision is refused
/// because a concurrent callback confirmed the same order first, that checkout is the result.
pub(super) async fn record_confirmation(
    decider: &DecisionMaker,
    event_store: &EventStore,
    command: ConfirmPaymentCommand,
) -> Result<CheckoutView, ClientError> {
    let checkout_id = command.checkout_id;
    let order_id = command.order_id;

    let Err(err) = decider.make(command).await else {
        return load_checkout(event_store, checkout_id).await;
    };
    let checkout = load_checkout(event_store, checkout_id).await?;
    if checkout.order_id == Some(order_id) {
        info!("Checkout {checkout_id}: order {order_id} was already confirmed ({err:?})");
        return Ok(checkout);
    }
    Err(err.into())
}

//------------------------- Command ----------------------------

/// Accepts a completed payment for the current attempt, even one past its deadline.
#[derive(Debug, Clone)]
pub struct ConfirmPaymentCommand {
    pub checkout_id: CheckoutId,
    pub attempt_id: AttemptId,
    pub order_id: OrderId,
    pub gateway_payment_id: String,
}

impl Decision for ConfirmPaymentCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        let attempt = state.current_attempt(self.attempt_id)?;
        if attempt.order_id != Some(self.order_id) {
            return Err(CheckoutError::AttemptNotOpened(self.attempt_id));
        }

        Ok(vec![DomainEvent::PaymentConfirmed {
            checkout_id: self.checkout_id,
            attempt_id: self.attempt_id,
            order_id: self.order_id,
            gateway_payment_id: self.gateway_payment_id.clone(),
        }])
    }
}

/// The customer closed the gateway window. The order stays pending and checkout stays at
/// payment.
#[derive(Debug, Clone)]
pub struct DismissPaymentCommand {
    pub checkout_id: CheckoutId,
    pub attempt_id: AttemptId,
}

impl Decision for DismissPaymentCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        state.current_attempt(self.attempt_id)?;

        Ok(vec![DomainEvent::PaymentAttemptDismissed {
            checkout_id: self.checkout_id,
            attempt_id: self.attempt_id,
        }])
    }
}

//-------------------------- Tests -------------------------------
