//! Attach Owner slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::infra::ClientError;

use super::{CartRegistry, CartStore, CartView, UserId};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AttachOwnerPayload {
    pub user_id: Uuid,
}

pub async fn attach_owner_endpoint(
    State(carts): State<CartRegistry>,
    Path(cart_uuid): Path<Uuid>,
    Json(payload): Json<AttachOwnerPayload>,
) -> Result<Json<CartView>, ClientError> {
    let cart_id = cart_uuid.try_into()?;
    let user_id: UserId = payload.user_id.try_into()?;

    let view = carts
        .update(cart_id, |store| {
            store.attach_owner(user_id);
            Ok(())
        })
        .await?;

    Ok(Json(view))
}

//------------------------- Operation ----------------------------

impl CartStore {
    /// Records the signed-in user. From now on every saved state is mirrored to their
    /// remote cart.
    pub fn attach_owner(&mut self, user_id: UserId) {
        self.owner = Some(user_id);
    }
}

//-------------------------- Tests -------------------------------
