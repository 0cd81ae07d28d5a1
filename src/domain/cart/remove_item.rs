use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::infra::ClientError;

use super::{Cart, CartError, CartLine, CartRegistry, CartView, LineKey, ProductId};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LinePayload {
    pub product_id: i64,
    pub size: String,
    pub color: String,
}

impl From<LinePayload> for LineKey {
    fn from(payload: LinePayload) -> Self {
        LineKey {
            product_id: ProductId(payload.product_id),
            size: payload.size,
            color: payload.color,
        }
    }
}

pub async fn remove_item_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
    Json(payload): Json<LinePayload>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;
    let key: LineKey = payload.into();

    let view = carts
        .update(cart_id, |store| store.cart_mut().remove_item(&key).map(|_| ()))
        .await?;

    Ok(Json(view))
}

//------------------------- Operation ----------------------------

impl Cart {
    /// Removes the line for this product variant. Other variants of the product stay.
    pub fn remove_item(&mut self, key: &LineKey) -> Result<CartLine, CartError> {
        let removed = self
            .lines()
            .iter()
            .find(|line| line.key() == *key)
            .cloned()
            .ok_or_else(|| CartError::LineNotInCart(key.clone()))?;
        self.retain(|line| line.key() != *key);
        Ok(removed)
    }
}

//-------------------------- Tests -------------------------------
