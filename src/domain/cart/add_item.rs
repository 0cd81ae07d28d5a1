//! Add Item slice

use axum::Json;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::infra::ClientError;

use super::{Cart, CartLine, CartRegistry, CartView, ProductId, check_price};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AddItemPayload {
    pub product_id: i64,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub size: String,
    pub color: String,
    pub quantity: Option<u32>,
}

pub async fn add_item_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
    Json(payload): Json<AddItemPayload>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;
    check_price(payload.price)?;

    let quantity = payload.quantity.unwrap_or(1);
    let selection = ProductSelection {
        product_id: ProductId(payload.product_id),
        name: payload.name,
        price: payload.price,
        image: payload.image,
        size: payload.size,
        color: payload.color,
    };

    let view = carts
        .update(cart_id, |store| {
            store.cart_mut().add_item(selection, quantity);
            Ok(())
        })
        .await?;

    Ok(Json(view))
}

//------------------------- Operation ----------------------------

/// A product variant picked from the catalog, before it has a quantity in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSelection {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub size: String,
    pub color: String,
}

impl From<CartLine> for ProductSelection {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product_id,
            name: line.name,
            price: line.price,
            image: line.image,
            size: line.size,
            color: line.color,
        }
    }
}

impl Cart {
    /// Adds `quantity` of a variant, merging into the existing line for the same
    /// product, size and color. A zero quantity counts as one.
    pub fn add_item(&mut self, selection: ProductSelection, quantity: u32) {
        let quantity = quantity.max(1);
        let line = CartLine {
            product_id: selection.product_id,
            name: selection.name,
            price: selection.price,
            image: selection.image,
            quantity,
            size: selection.size,
            color: selection.color,
        };

        match self.line_mut(&line.key()) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.push(line),
        }
    }
}

//-------------------------- Tests -------------------------------
