use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use disintegrate::DecisionError;
use tracing::error;
use validator::ValidationErrors;

use crate::domain::{
    UuidNotCompatible,
    cart::CartError,
    checkout::CheckoutError,
    orders::{GatewayError, OrderError},
};

const CHECK_THE_LOGS: &str = "Please ask your system administrator to check the logs.";

#[derive(Debug)]
pub enum ClientError {
    Decision(DecisionError<CheckoutError>),
    Checkout(CheckoutError),
    Cart(CartError),
    Order(OrderError),
    Validation(ValidationErrors),
    Payload(String),
    NotFound(String),
    Internal(anyhow::Error),
}

#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<BTreeMap<String, Vec<String>>>,
}

impl ClientError {
    pub fn status(&self) -> StatusCode {
        match self {
            ClientError::Decision(DecisionError::Domain(checkout_error))
            | ClientError::Checkout(checkout_error) => checkout_status(checkout_error),
            ClientError::Decision(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ClientError::Cart(_) | ClientError::Payload(_) => StatusCode::BAD_REQUEST,
            ClientError::Order(order_error) => match order_error {
                OrderError::MissingAddress
                | OrderError::EmptyCart
                | OrderError::InvalidAmount
                | OrderError::PaymentNotConfirmed => StatusCode::BAD_REQUEST,
                OrderError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderError::Gateway(_) => StatusCode::BAD_GATEWAY,
                OrderError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ClientError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ClientError::NotFound(_) => StatusCode::NOT_FOUND,
            ClientError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message a customer may see. Infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ClientError::Decision(DecisionError::Domain(checkout_error))
            | ClientError::Checkout(checkout_error) => checkout_error.to_string(),
            ClientError::Decision(DecisionError::EventStore(_)) => {
                format!("EventStore problem. {CHECK_THE_LOGS}")
            }
            ClientError::Decision(DecisionError::StateStore(_)) => {
                format!("StateStore problem. {CHECK_THE_LOGS}")
            }
            ClientError::Cart(cart_error) => cart_error.to_string(),
            ClientError::Order(OrderError::Gateway(_)) => {
                "Payment could not be started. Please try again.".to_owned()
            }
            ClientError::Order(order_error) => order_error.to_string(),
            ClientError::Validation(_) => "Please correct the highlighted fields.".to_owned(),
            ClientError::Payload(message) | ClientError::NotFound(message) => message.clone(),
            ClientError::Internal(_) => CHECK_THE_LOGS.to_owned(),
        }
    }

    fn fields(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let ClientError::Validation(errors) = self else {
            return None;
        };
        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|error| {
                        error
                            .message
                            .as_ref()
                            .map(|message| message.to_string())
                            .unwrap_or_else(|| error.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();
        Some(fields)
    }
}

fn checkout_status(checkout_error: &CheckoutError) -> StatusCode {
    match checkout_error {
        CheckoutError::PaymentInProgress => StatusCode::CONFLICT,
        CheckoutError::CheckoutDoesNotExist(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed with {status}: {self:?}");
        }

        let body = ErrorResponse {
            message: self.public_message(),
            fields: self.fields(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<DecisionError<CheckoutError>> for ClientError {
    fn from(decision_error: DecisionError<CheckoutError>) -> Self {
        ClientError::Decision(decision_error)
    }
}

impl From<CheckoutError> for ClientError {
    fn from(checkout_error: CheckoutError) -> Self {
        ClientError::Checkout(checkout_error)
    }
}

impl From<CartError> for ClientError {
    fn from(cart_error: CartError) -> Self {
        ClientError::Cart(cart_error)
    }
}

impl From<OrderError> for ClientError {
    fn from(order_error: OrderError) -> Self {
        ClientError::Order(order_error)
    }
}

impl From<GatewayError> for ClientError {
    fn from(gateway_error: GatewayError) -> Self {
        ClientError::Order(OrderError::Gateway(gateway_error))
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        ClientError::Validation(errors)
    }
}

impl From<UuidNotCompatible> for ClientError {
    fn from(value: UuidNotCompatible) -> Self {
        ClientError::Payload(value.to_string())
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(value: anyhow::Error) -> Self {
        ClientError::Internal(value)
    }
}

//-------------------------- Tests -------------------------------

#[cfg(test)]
mod tests {
    use validator::Validate;

    use crate::domain::checkout::{CheckoutId, ShippingDetails};

    use super::*;

    #[test]
    fn checkout_rule_violations_map_to_client_statuses() {
        let checkout_id = CheckoutId::new();

        assert_eq!(
            ClientError::from(DecisionError::Domain(CheckoutError::PaymentInProgress)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ClientError::from(CheckoutError::CheckoutDoesNotExist(checkout_id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ClientError::from(CheckoutError::EmptyCart).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn gateway_and_persistence_failures_hide_their_details() {
        let gateway = ClientError::from(GatewayError::Unavailable("10.0.0.7 refused".to_owned()));
        let persistence =
            ClientError::from(OrderError::Persistence(anyhow::anyhow!("pg: relation missing")));

        assert_eq!(gateway.status(), StatusCode::BAD_GATEWAY);
        assert!(!gateway.public_message().contains("10.0.0.7"));
        assert_eq!(persistence.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!persistence.public_message().contains("relation"));
    }

    #[test]
    fn validation_errors_list_messages_per_field() {
        let details = ShippingDetails {
            first_name: String::new(),
            last_name: "Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            phone: "5550100100".to_owned(),
            address: "12 Analytical Way".to_owned(),
            city: "London".to_owned(),
            state: "LN".to_owned(),
            zip_code: "10001".to_owned(),
            address_id: None,
        };
        let error = ClientError::from(details.validate().expect_err("Details should be invalid."));

        let fields = error.fields().expect("Fields should be reported.");

        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(fields["first_name"], vec!["First name is required".to_owned()]);
        assert_eq!(fields.len(), 1);
    }
}
