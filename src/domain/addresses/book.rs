//! A user's saved shipping addresses.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::{domain::cart::UserId, uuid_id};

uuid_id!(AddressId);

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct SavedAddress {
    pub address_id: AddressId,
    pub user_id: UserId,
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub address: ShippingAddress,
    pub is_default: bool,
}

#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Saved addresses, default first, then oldest first.
    async fn list(&self, user_id: UserId) -> Result<Vec<SavedAddress>, anyhow::Error>;

    /// Saves a new address. A user's first address becomes their default.
    async fn save(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<SavedAddress, anyhow::Error>;

    /// Makes one of the user's addresses the default. `Ok(None)` when the user has no such
    /// address.
    async fn set_default(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<SavedAddress>, anyhow::Error>;

    async fn default_for(&self, user_id: UserId) -> Result<Option<SavedAddress>, anyhow::Error> {
        Ok(self.list(user_id).await?.into_iter().next())
    }

    /// The user's saved entry for exactly this address, saving it first if there is none.
    async fn find_or_save(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<SavedAddress, anyhow::Error> {
        match self
            .list(user_id)
            .await?
            .into_iter()
            .find(|saved| saved.address == *address)
        {
            Some(saved) => Ok(saved),
            None => self.save(user_id, address).await,
        }
    }
}

pub type SharedAddressBook = Arc<dyn AddressBook>;

#[derive(Debug, Clone)]
pub struct PgAddressBook {
    pool: PgPool,
}

impl PgAddressBook {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressBook for PgAddressBook {
    async fn list(&self, user_id: UserId) -> Result<Vec<SavedAddress>, anyhow::Error> {
        sqlx::query_as::<_, SavedAddress>(
            r#"SELECT address_id, user_id, street, city, state, zip_code, is_default
               FROM addresses
               WHERE user_id = $1
               ORDER BY is_default DESC, created_at ASC, address_id ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Problem listing addresses for user {user_id}."))
    }

    async fn save(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<SavedAddress, anyhow::Error> {
        let address_id = AddressId::new();
        let is_default: bool = sqlx::query_scalar(
            r#"INSERT INTO addresses (address_id, user_id, street, city, state, zip_code, is_default)
               VALUES ($1, $2, $3, $4, $5, $6,
                       NOT EXISTS (SELECT 1 FROM addresses WHERE user_id = $2))
               RETURNING is_default"#,
        )
        .bind(address_id)
        .bind(user_id)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.zip_code)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("Problem saving address for user {user_id}."))?;

        Ok(SavedAddress {
            address_id,
            user_id,
            address: address.clone(),
            is_default,
        })
    }

    async fn set_default(
        &self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<SavedAddress>, anyhow::Error> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Problem starting address transaction.")?;

        let updated = sqlx::query(
            r#"UPDATE addresses
               SET is_default = (address_id = $2), updated_at = now()
               WHERE user_id = $1
                 AND EXISTS (SELECT 1 FROM addresses WHERE user_id = $1 AND address_id = $2)"#,
        )
        .bind(user_id)
        .bind(address_id)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Problem setting default address {address_id}."))?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.context("Problem rolling back address transaction.")?;
            return Ok(None);
        }

        let saved = sqlx::query_as::<_, SavedAddress>(
            r#"SELECT address_id, user_id, street, city, state, zip_code, is_default
               FROM addresses WHERE address_id = $1"#,
        )
        .bind(address_id)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("Problem reading address {address_id}."))?;

        tx.commit().await.context("Problem committing address transaction.")?;
        Ok(Some(saved))
    }
}

//-------------------------- Tests -------------------------------
