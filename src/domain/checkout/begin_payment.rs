//! Begin Payment slice
//!
//! Guards against double submission, then places the order and opens it with the gateway.
//! Whatever goes wrong after the attempt has started releases the attempt again so the
//! customer can retry.

use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
};
use disintegrate::Decision;
use jiff::{SignedDuration, Timestamp};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{
        DecisionMaker, DomainEvent, EventStore,
        addresses::SharedAddressBook,
        cart::CartRegistry,
        orders::{GatewayHandoff, OrderId, OrderRecordWriter, PaymentRequest},
    },
    infra::ClientError,
};

use super::{
    AttemptId, CheckoutError, CheckoutId, CheckoutProgress, CheckoutStep, CheckoutView,
    PaymentDetails, load_checkout,
};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Serialize)]
pub struct PaymentOpened {
    pub checkout: CheckoutView,
    pub attempt_id: AttemptId,
    pub handoff: GatewayHandoff,
}

pub async fn begin_payment_endpoint(
    State(decider): State<DecisionMaker>,
    State(event_store): State<EventStore>,
    State(carts): State<CartRegistry>,
    State(addresses): State<SharedAddressBook>,
    State(writer): State<OrderRecordWriter>,
    Path(checkout_uuid): Path<Uuid>,
    Json(payment): Json<PaymentDetails>,
) -> Result<Json<PaymentOpened>, ClientError> {
    let checkout_id: CheckoutId = checkout_uuid.try_into()?;
    payment.validate()?;
    drop(payment);

    let now = Timestamp::now();
    let expires_at = SignedDuration::try_from(writer.attempt_timeout())
        .and_then(|timeout| now.checked_add(timeout))
        .context("Payment attempt deadline is out of range.")?;
    let attempt_id = AttemptId::new();

    decider
        .make(BeginPaymentCommand {
            checkout_id,
            attempt_id,
            now,
            expires_at,
        })
        .await?;

    let opened = async {
        let checkout = load_checkout(&event_store, checkout_id).await?;
        let contact = checkout.contact.clone().ok_or(CheckoutError::WrongStep {
            expected: CheckoutStep::Payment,
            actual: checkout.step,
        })?;
        let cart = carts.snapshot(checkout.cart_id).await;

        // The shipping step could not save the entered address; it gets one more try here.
        let address_id = match (checkout.address_id, checkout.user_id, &checkout.address) {
            (Some(address_id), _, _) => Some(address_id),
            (None, Some(user_id), Some(address)) => {
                match addresses.find_or_save(user_id, address).await {
                    Ok(saved) => Some(saved.address_id),
                    Err(err) => {
                        warn!("Checkout {checkout_id}: shipping address could not be saved: {err:?}");
                        None
                    }
                }
            }
            _ => None,
        };

        let handoff = writer
            .open_payment(PaymentRequest {
                user_id: checkout.user_id,
                address_id,
                summary: cart.summary()?,
                lines: cart.lines,
                contact,
            })
            .await?;
        Ok::<_, ClientError>(handoff)
    }
    .await;

    let handoff = match opened {
        Ok(handoff) => handoff,
        Err(err) => {
            release_attempt(&decider, checkout_id, attempt_id, err.public_message()).await;
            return Err(err);
        }
    };

    decider
        .make(OpenPaymentAttemptCommand {
            checkout_id,
            attempt_id,
            order_id: handoff.receipt,
            gateway_order_id: handoff.order_id.clone(),
        })
        .await?;
    info!("Checkout {checkout_id}: payment attempt {attempt_id} handed to gateway");

    Ok(Json(PaymentOpened {
        checkout: load_checkout(&event_store, checkout_id).await?,
        attempt_id,
        handoff,
    }))
}

/// Ends an attempt that can no longer succeed. Failing to record that is only logged; the
/// attempt deadline frees the checkout eventually.
pub(super) async fn release_attempt(
    decider: &DecisionMaker,
    checkout_id: CheckoutId,
    attempt_id: AttemptId,
    reason: String,
) {
    if let Err(err) = decider
        .make(FailPaymentAttemptCommand {
            checkout_id,
            attempt_id,
            reason,
        })
        .await
    {
        warn!("Checkout {checkout_id}: attempt {attempt_id} could not be released: {err:?}");
    }
}

//------------------------- Command ----------------------------

/// Starts a payment attempt. At most one attempt is in flight; an attempt past its deadline is
/// expired to make room for the new one.
#[derive(Debug, Clone)]
pub struct BeginPaymentCommand {
    pub checkout_id: CheckoutId,
    pub attempt_id: AttemptId,
    pub now: Timestamp,
    pub expires_at: Timestamp,
}

impl Decision for BeginPaymentCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        state.ensure_step(CheckoutStep::Payment)?;
        let checkout_id = self.checkout_id;

        let mut events = Vec::new();
        if let Some(attempt) = state.attempt() {
            if !attempt.has_expired(self.now) {
                return Err(CheckoutError::PaymentInProgress);
            }
            events.push(DomainEvent::PaymentAttemptExpired {
                checkout_id,
                attempt_id: attempt.attempt_id,
            });
        }
        events.push(DomainEvent::PaymentAttemptStarted {
            checkout_id,
            attempt_id: self.attempt_id,
            expires_at: self.expires_at,
        });
        Ok(events)
    }
}

/// Records the order and gateway order an attempt is paying for.
#[derive(Debug, Clone)]
pub struct OpenPaymentAttemptCommand {
    pub checkout_id: CheckoutId,
    pub attempt_id: AttemptId,
    pub order_id: OrderId,
    pub gateway_order_id: String,
}

impl Decision for OpenPaymentAttemptCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        let attempt = state.current_attempt(self.attempt_id)?;
        if attempt.order_id.is_some() {
            return Err(CheckoutError::AttemptAlreadyOpened(self.attempt_id));
        }

        Ok(vec![DomainEvent::PaymentAttemptOpened {
            checkout_id: self.checkout_id,
            attempt_id: self.attempt_id,
            order_id: self.order_id,
            gateway_order_id: self.gateway_order_id.clone(),
        }])
    }
}

#[derive(Debug, Clone)]
pub struct FailPaymentAttemptCommand {
    pub checkout_id: CheckoutId,
    pub attempt_id: AttemptId,
    pub reason: String,
}

impl Decision for FailPaymentAttemptCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        state.current_attempt(self.attempt_id)?;

        Ok(vec![DomainEvent::PaymentAttemptFailed {
            checkout_id: self.checkout_id,
            attempt_id: self.attempt_id,
            reason: self.reason.clone(),
        }])
    }
}

//-------------------------- Tests -------------------------------
