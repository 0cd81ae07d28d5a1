use super::{AttemptId, CheckoutId, CheckoutStep};

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CheckoutError {
    #[error("Checkout {0} already exists.")]
    IdConsumed(CheckoutId),
    #[error("Checkout {0} does not exist.")]
    CheckoutDoesNotExist(CheckoutId),
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Checkout {0} has been closed.")]
    CheckoutClosed(CheckoutId),
    #[error("Checkout is at the {actual} step, this requires the {expected} step.")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
    #[error("A payment is already being processed. Please wait.")]
    PaymentInProgress,
    #[error("Payment attempt {0} is not the current attempt.")]
    AttemptNotCurrent(AttemptId),
    #[error("Payment attempt {0} has not been opened with the payment gateway.")]
    AttemptNotOpened(AttemptId),
    #[error("Payment attempt {0} has already been opened with the payment gateway.")]
    AttemptAlreadyOpened(AttemptId),
}
