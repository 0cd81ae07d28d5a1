//! Go Back slice

use axum::{
    Json,
    extract::{Path, State},
};
use disintegrate::Decision;
use jiff::Timestamp;
use uuid::Uuid;

use crate::{
    domain::{DecisionMaker, DomainEvent, EventStore},
    infra::ClientError,
};

use super::{CheckoutError, CheckoutId, CheckoutProgress, CheckoutStep, CheckoutView, Destination, load_checkout};

//------------------------- Web API ----------------------------

pub async fn go_back_endpoint(
    State(decider): State<DecisionMaker>,
    State(event_store): State<EventStore>,
    Path(checkout_uuid): Path<Uuid>,
) -> Result<Json<CheckoutView>, ClientError> {
    let checkout_id: CheckoutId = checkout_uuid.try_into()?;

    decider
        .make(GoBackCommand {
            checkout_id,
            now: Timestamp::now(),
        })
        .await?;

    Ok(Json(load_checkout(&event_store, checkout_id).await?))
}

//------------------------- Command ----------------------------

/// Steps back once: payment returns to shipping, while shipping and confirmation leave
/// checkout altogether.
#[derive(Debug, Clone)]
pub struct GoBackCommand {
    pub checkout_id: CheckoutId,
    pub now: Timestamp,
}

impl Decision for GoBackCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        state.ensure_active()?;
        let checkout_id = self.checkout_id;

        match state.step() {
            CheckoutStep::Shipping => Ok(vec![DomainEvent::CheckoutExited {
                checkout_id,
                destination: Destination::Cart,
            }]),
            CheckoutStep::Payment => {
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
                events.push(DomainEvent::ReturnedToShipping { checkout_id });
                Ok(events)
            }
            CheckoutStep::Confirmation => Ok(vec![DomainEvent::CheckoutExited {
                checkout_id,
                destination: Destination::Catalog,
            }]),
        }
    }
}

//-------------------------- Tests -------------------------------
