//! The checkout form as submitted, and the rules each field must satisfy.

use validator::Validate;

use crate::domain::addresses::{AddressId, ShippingAddress};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, Validate)]
pub struct ShippingDetails {
    #[validate(length(min = 2, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 2, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 10, message = "Valid phone number is required"))]
    pub phone: String,
    #[validate(length(min = 5, message = "Address is required"))]
    pub address: String,
    #[validate(length(min = 2, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 2, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 5, message = "Valid ZIP code is required"))]
    pub zip_code: String,
    /// A saved address the customer picked. Without one the entered address is saved.
    #[serde(default)]
    pub address_id: Option<AddressId>,
}

impl ShippingDetails {
    pub fn contact(&self) -> Contact {
        Contact {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn address(&self) -> ShippingAddress {
        ShippingAddress {
            street: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
        }
    }
}

/// Card fields from the payment step. They are checked and dropped; the gateway's own UI
/// collects the card, so nothing here is stored or forwarded.
#[derive(Clone, serde::Deserialize, Validate)]
pub struct PaymentDetails {
    #[validate(length(min = 16, message = "Valid card number is required"))]
    pub card_number: String,
    #[validate(length(min = 2, message = "Name on card is required"))]
    pub card_name: String,
    #[validate(length(min = 5, message = "Expiration date is required"))]
    pub exp_date: String,
    #[validate(length(min = 3, message = "CVV is required"))]
    pub cvv: String,
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("card_number", &"<redacted>")
            .field("card_name", &"<redacted>")
            .field("exp_date", &"<redacted>")
            .field("cvv", &"<redacted>")
            .finish()
    }
}

//-------------------------- Tests -------------------------------
