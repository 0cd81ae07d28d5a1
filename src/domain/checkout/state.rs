//! Where a checkout stands, as every checkout decision sees it.

use disintegrate::{StateMutate, StateQuery};
use jiff::Timestamp;

use crate::domain::{CheckoutStream, orders::OrderId};

use super::{AttemptId, CheckoutError, CheckoutId};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum_macros::Display,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Confirmation,
}

/// Where the customer lands after leaving checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Cart,
    Catalog,
}

/// The payment attempt in flight. While one exists the checkout is processing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AttemptProgress {
    pub attempt_id: AttemptId,
    pub expires_at: Timestamp,
    pub order_id: Option<OrderId>,
}

impl AttemptProgress {
    pub fn has_expired(&self, now: Timestamp) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Eq, StateQuery, serde::Serialize, serde::Deserialize)]
#[state_query(CheckoutStream)]
pub struct CheckoutProgress {
    #[id]
    checkout_id: CheckoutId,
    started: bool,
    exited: bool,
    step: CheckoutStep,
    attempt: Option<AttemptProgress>,
}

impl CheckoutProgress {
    pub fn new(checkout_id: CheckoutId) -> Self {
        Self {
            checkout_id,
            started: false,
            exited: false,
            step: CheckoutStep::default(),
            attempt: None,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn attempt(&self) -> Option<&AttemptProgress> {
        self.attempt.as_ref()
    }

    pub fn is_processing(&self) -> bool {
        self.attempt.is_some()
    }

    /// The checkout exists and has not been left.
    pub fn ensure_active(&self) -> Result<(), CheckoutError> {
        if !self.started {
            Err(CheckoutError::CheckoutDoesNotExist(self.checkout_id))
        } else if self.exited {
            Err(CheckoutError::CheckoutClosed(self.checkout_id))
        } else {
            Ok(())
        }
    }

    pub fn ensure_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        self.ensure_active()?;
        if self.step == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep {
                expected,
                actual: self.step,
            })
        }
    }

    /// The in-flight attempt, if it is the one named.
    pub fn current_attempt(&self, attempt_id: AttemptId) -> Result<&AttemptProgress, CheckoutError> {
        self.ensure_step(CheckoutStep::Payment)?;
        self.attempt
            .as_ref()
            .filter(|attempt| attempt.attempt_id == attempt_id)
            .ok_or(CheckoutError::AttemptNotCurrent(attempt_id))
    }
}

impl StateMutate for CheckoutProgress {
    fn mutate(&mut self, event: Self::Event) {
        match event {
            CheckoutStream::CheckoutStarted { .. } => {
                self.started = true;
                self.step = CheckoutStep::Shipping;
            }
            CheckoutStream::ShippingDetailsAccepted { .. } => {
                self.step = CheckoutStep::Payment;
            }
            CheckoutStream::ReturnedToShipping { .. } => {
                self.step = CheckoutStep::Shipping;
            }
            CheckoutStream::PaymentAttemptStarted {
                attempt_id,
                expires_at,
                ..
            } => {
                self.attempt = Some(AttemptProgress {
                    attempt_id,
                    expires_at,
                    order_id: None,
                });
            }
            CheckoutStream::PaymentAttemptOpened {
                attempt_id,
                order_id,
                ..
            } => {
                if let Some(attempt) = self
                    .attempt
                    .as_mut()
                    .filter(|attempt| attempt.attempt_id == attempt_id)
                {
                    attempt.order_id = Some(order_id);
                }
            }
            CheckoutStream::PaymentAttemptFailed { .. }
            | CheckoutStream::PaymentAttemptDismissed { .. }
            | CheckoutStream::PaymentAttemptExpired { .. } => {
                self.attempt = None;
            }
            CheckoutStream::PaymentConfirmed { .. } => {
                self.attempt = None;
                self.step = CheckoutStep::Confirmation;
            }
            CheckoutStream::CheckoutExited { .. } => {
                self.exited = true;
            }
        }
    }
}
