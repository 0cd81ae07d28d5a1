//! Saved Addresses slice

use axum::{
    Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{domain::cart::UserId, infra::ClientError};

use super::{AddressId, SavedAddress, SharedAddressBook};

//------------------------- Web API ----------------------------

pub async fn list_addresses_endpoint(
    State(addresses): State<SharedAddressBook>,
    Path(user_uuid): Path<Uuid>,
) -> Result<Json<Vec<SavedAddress>>, ClientError> {
    let user_id: UserId = user_uuid.try_into()?;
    Ok(Json(addresses.list(user_id).await?))
}

pub async fn set_default_address_endpoint(
    State(addresses): State<SharedAddressBook>,
    Path((user_uuid, address_uuid)): Path<(Uuid, Uuid)>,
) -> Result<Json<SavedAddress>, ClientError> {
    let user_id: UserId = user_uuid.try_into()?;
    let address_id: AddressId = address_uuid.try_into()?;

    addresses
        .set_default(user_id, address_id)
        .await?
        .map(Json)
        .ok_or_else(|| ClientError::NotFound(format!("Address {address_id} does not exist.")))
}
