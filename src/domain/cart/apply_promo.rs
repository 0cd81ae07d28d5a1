//! Apply Promo Code slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{domain::pricing::PromoCode, infra::ClientError};

use super::{CartError, CartRegistry, CartStore, CartView};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PromoPayload {
    pub code: String,
}

pub async fn apply_promo_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
    Json(payload): Json<PromoPayload>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;

    let view = carts
        .update(cart_id, |store| store.apply_promo(&payload.code).map(|_| ()))
        .await?;

    Ok(Json(view))
}

//------------------------- Operation ----------------------------

impl CartStore {
    /// Applies a recognised promo code to the session. An unknown code leaves any
    /// previously applied code in place.
    pub fn apply_promo(&mut self, code: &str) -> Result<PromoCode, CartError> {
        let promo_code: PromoCode = code
            .trim()
            .parse()
            .map_err(|_| CartError::InvalidPromoCode)?;
        self.promo_code = Some(promo_code);
        Ok(promo_code)
    }
}

//-------------------------- Tests -------------------------------

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::cart::{Cart, CartId, CartLine, ProductId};

    use super::*;

    fn store_with_subtotal_of_fifty() -> CartStore {
        let line = CartLine {
            product_id: ProductId(1),
            name: "Linen shirt".to_owned(),
            price: Decimal::from(25),
            image: "/images/linen-shirt.jpg".to_owned(),
            quantity: 2,
            size: "M".to_owned(),
            color: "White".to_owned(),
        };
        CartStore::new(CartId::new(), Cart::from_lines([line]))
    }

    #[test]
    fn welcome_code_discounts_ten_percent() {
        let mut store = store_with_subtotal_of_fifty();

        assert_eq!(store.apply_promo("welcome10"), Ok(PromoCode::Welcome10));

        let view = store.view().expect("View should succeed.");
        assert_eq!(view.promo_code, Some(PromoCode::Welcome10));
        assert_eq!(view.summary.discount, Decimal::new(500, 2));
        assert_eq!(view.summary.total, Decimal::new(5449, 2));
    }

    #[test]
    fn unknown_code_is_rejected_and_keeps_the_applied_code() {
        let mut store = store_with_subtotal_of_fifty();
        store.apply_promo("WELCOME10").expect("Code should apply.");

        assert_eq!(store.apply_promo("SUMMER50"), Err(CartError::InvalidPromoCode));
        assert_eq!(store.promo_code(), Some(PromoCode::Welcome10));
    }

    #[test]
    fn invalid_code_message_is_generic() {
        assert_eq!(
            CartError::InvalidPromoCode.to_string(),
            "Please enter a valid promo code"
        );
    }
}
