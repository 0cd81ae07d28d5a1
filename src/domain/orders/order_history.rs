//! Order History slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{domain::cart::UserId, infra::ClientError};

use super::{Order, OrderError, OrderId, OrderRecordWriter};

//------------------------- Web API ----------------------------

pub async fn user_orders_endpoint(
    State(writer): State<OrderRecordWriter>,
    Path(user_uuid): Path<Uuid>,
) -> Result<Json<Vec<Order>>, ClientError> {
    let user_id: UserId = user_uuid.try_into()?;
    Ok(Json(writer.orders().orders_for_user(user_id).await?))
}

pub async fn order_endpoint(
    State(writer): State<OrderRecordWriter>,
    Path(order_uuid): Path<Uuid>,
) -> Result<Json<Order>, ClientError> {
    let order_id: OrderId = order_uuid.try_into()?;
    writer
        .orders()
        .find_order(order_id)
        .await?
        .map(Json)
        .ok_or_else(|| OrderError::OrderNotFound(order_id).into())
}
