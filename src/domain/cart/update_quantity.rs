//! Update Quantity slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::infra::ClientError;

use super::{Cart, CartError, CartRegistry, CartView, LineKey, ProductId};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct UpdateQuantityPayload {
    pub product_id: i64,
    pub size: String,
    pub color: String,
    #[serde(flatten)]
    pub update: QuantityUpdate,
}

pub async fn update_quantity_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
    Json(payload): Json<UpdateQuantityPayload>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;
    let key = LineKey {
        product_id: ProductId(payload.product_id),
        size: payload.size,
        color: payload.color,
    };

    let view = carts
        .update(cart_id, |store| {
            store
                .cart_mut()
                .update_quantity(&key, payload.update)
                .map(|_| ())
        })
        .await?;

    Ok(Json(view))
}

//------------------------- Operation ----------------------------

/// Either a relative change (`{"change": -1}`) or a new value (`{"quantity": 3}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum QuantityUpdate {
    By { change: i64 },
    To { quantity: u32 },
}

impl Cart {
    /// Changes the quantity of a line. Quantities never go below 1; removing a line is
    /// always an explicit [`Cart::remove_item`].
    pub fn update_quantity(&mut self, key: &LineKey, update: QuantityUpdate) -> Result<u32, CartError> {
        let line = self
            .line_mut(key)
            .ok_or_else(|| CartError::LineNotInCart(key.clone()))?;

        let requested = match update {
            QuantityUpdate::By { change } => i64::from(line.quantity).saturating_add(change),
            QuantityUpdate::To { quantity } => i64::from(quantity),
        };
        line.quantity = u32::try_from(requested.max(1)).unwrap_or(u32::MAX);
        Ok(line.quantity)
    }
}

//-------------------------- Tests -------------------------------

#[cfg(test)]
mod tests {
    use fake::{Fake, Faker};

    use crate::domain::cart::CartLine;

    use super::*;

    fn cart_with(quantity: u32) -> (Cart, LineKey) {
        let line = CartLine {
            quantity,
            ..Faker.fake()
        };
        let key = line.key();
        (Cart::from_lines([line]), key)
    }

    #[test]
    fn change_adjusts_quantity() {
        let (mut cart, key) = cart_with(2);

        let quantity = cart.update_quantity(&key, QuantityUpdate::By { change: 3 });

        assert_eq!(quantity, Ok(5));
    }

    #[test]
    fn decrementing_past_one_clamps_to_one() {
        let (mut cart, key) = cart_with(2);

        for change in [-1, -1, -5, i64::MIN] {
            let quantity = cart
                .update_quantity(&key, QuantityUpdate::By { change })
                .expect("Line should exist.");
            assert!(quantity >= 1, "Quantity dropped below one after {change}.");
        }

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn setting_zero_clamps_to_one() {
        let (mut cart, key) = cart_with(4);

        assert_eq!(cart.update_quantity(&key, QuantityUpdate::To { quantity: 0 }), Ok(1));
        assert_eq!(cart.update_quantity(&key, QuantityUpdate::To { quantity: 6 }), Ok(6));
    }

    #[test]
    fn updating_an_unknown_line_fails() {
        let (mut cart, _) = cart_with(1);
        let other: CartLine = Faker.fake();
        let other = CartLine {
            product_id: ProductId(-1),
            ..other
        };

        assert_eq!(
            cart.update_quantity(&other.key(), QuantityUpdate::By { change: 1 }),
            Err(CartError::LineNotInCart(other.key()))
        );
    }

    #[test]
    fn payload_accepts_change_or_quantity() {
        let by: UpdateQuantityPayload = serde_json::from_str(
            r#"{"product_id": 1, "size": "M", "color": "Red", "change": -1}"#,
        )
        .expect("Change payload should parse.");
        let to: UpdateQuantityPayload = serde_json::from_str(
            r#"{"product_id": 1, "size": "M", "color": "Red", "quantity": 4}"#,
        )
        .expect("Quantity payload should parse.");

        assert_eq!(by.update, QuantityUpdate::By { change: -1 });
        assert_eq!(to.update, QuantityUpdate::To { quantity: 4 });
    }
}
