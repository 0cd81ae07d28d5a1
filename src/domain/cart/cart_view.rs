//! Cart View slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::infra::ClientError;

use super::{CartRegistry, CartView};

//------------------------- Web API ----------------------------

pub async fn cart_view_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;
    Ok(Json(carts.view(cart_id).await?))
}
