//! Checkout View slice

use axum::{
    Json,
    extract::{Path, State},
};
use disintegrate::query;
use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{
        CheckoutStream, EventReadingError, EventStore,
        addresses::{AddressId, ShippingAddress},
        cart::{CartId, UserId},
        orders::OrderId,
        read_from_events,
    },
    infra::ClientError,
};

use super::{AttemptId, CheckoutError, CheckoutId, CheckoutStep, Contact, Destination};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CheckoutView {
    pub checkout_id: CheckoutId,
    pub cart_id: CartId,
    pub user_id: Option<UserId>,
    pub step: CheckoutStep,
    pub processing: bool,
    pub contact: Option<Contact>,
    pub address: Option<ShippingAddress>,
    pub address_id: Option<AddressId>,
    pub attempt: Option<AttemptView>,
    /// Why the last payment attempt did not go through, until a new one starts.
    pub last_payment_error: Option<String>,
    pub order_id: Option<OrderId>,
    pub exited_to: Option<Destination>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct AttemptView {
    pub attempt_id: AttemptId,
    pub expires_at: Timestamp,
    pub order_id: Option<OrderId>,
    pub gateway_order_id: Option<String>,
}

impl CheckoutView {
    fn new(checkout_id: CheckoutId, cart_id: CartId, user_id: Option<UserId>) -> Self {
        Self {
            checkout_id,
            cart_id,
            user_id,
            step: CheckoutStep::Shipping,
            processing: false,
            contact: None,
            address: None,
            address_id: None,
            attempt: None,
            last_payment_error: None,
            order_id: None,
            exited_to: None,
        }
    }

    fn end_attempt(&mut self, error: Option<String>) {
        self.attempt = None;
        self.processing = false;
        self.last_payment_error = error;
    }
}

pub async fn checkout_view_endpoint(
    State(event_store): State<EventStore>,
    Path(checkout_uuid): Path<Uuid>,
) -> Result<Json<CheckoutView>, ClientError> {
    let checkout_id: CheckoutId = checkout_uuid.try_into()?;
    Ok(Json(load_checkout(&event_store, checkout_id).await?))
}

//----------------------- Implementation --------------------------

/// Reads the checkout view, treating a checkout without events as unknown.
pub async fn load_checkout(
    event_store: &EventStore,
    checkout_id: CheckoutId,
) -> Result<CheckoutView, ClientError> {
    checkout_view_read_model(event_store, &checkout_id)
        .await?
        .ok_or_else(|| CheckoutError::CheckoutDoesNotExist(checkout_id).into())
}

pub async fn checkout_view_read_model(
    event_store: &EventStore,
    checkout_id: &CheckoutId,
) -> Result<Option<CheckoutView>, EventReadingError> {
    let query = query!(CheckoutStream; checkout_id == *checkout_id);
    read_from_events(event_store, &query, None, apply_event).await
}

fn apply_event(view: Option<CheckoutView>, event: CheckoutStream) -> Option<CheckoutView> {
    match (view, event) {
        (
            None,
            CheckoutStream::CheckoutStarted {
                checkout_id,
                cart_id,
                user_id,
            },
        ) => Some(CheckoutView::new(checkout_id, cart_id, user_id)),
        (None, _) => None,
        (Some(mut view), event) => {
            view.apply(event);
            Some(view)
        }
    }
}

impl CheckoutView {
    fn apply(&mut self, event: CheckoutStream) {
        match event {
            CheckoutStream::CheckoutStarted { .. } => {}
            CheckoutStream::ShippingDetailsAccepted {
                contact,
                address,
                address_id,
                ..
            } => {
                self.step = CheckoutStep::Payment;
                self.contact = Some(contact);
                self.address = Some(address);
                self.address_id = address_id;
            }
            CheckoutStream::ReturnedToShipping { .. } => {
                self.step = CheckoutStep::Shipping;
            }
            CheckoutStream::PaymentAttemptStarted {
                attempt_id,
                expires_at,
                ..
            } => {
                self.processing = true;
                self.last_payment_error = None;
                self.attempt = Some(AttemptView {
                    attempt_id,
                    expires_at,
                    order_id: None,
                    gateway_order_id: None,
                });
            }
            CheckoutStream::PaymentAttemptOpened {
                attempt_id,
                order_id,
                gateway_order_id,
                ..
            } => {
                if let Some(attempt) = self
                    .attempt
                    .as_mut()
                    .filter(|attempt| attempt.attempt_id == attempt_id)
                {
                    attempt.order_id = Some(order_id);
                    attempt.gateway_order_id = Some(gateway_order_id);
                }
            }
            CheckoutStream::PaymentAttemptFailed { reason, .. } => {
                self.end_attempt(Some(reason));
            }
            CheckoutStream::PaymentAttemptDismissed { .. } => {
                self.end_attempt(Some("Payment was cancelled.".to_owned()));
            }
            CheckoutStream::PaymentAttemptExpired { .. } => {
                self.end_attempt(Some("Payment timed out.".to_owned()));
            }
            CheckoutStream::PaymentConfirmed { order_id, .. } => {
                self.end_attempt(None);
                self.step = CheckoutStep::Confirmation;
                self.order_id = Some(order_id);
            }
            CheckoutStream::CheckoutExited { destination, .. } => {
                self.exited_to = Some(destination);
            }
        }
    }
}

//-------------------------- Tests -------------------------------
