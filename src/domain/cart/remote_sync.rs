//! Best-effort mirroring of a signed-in user's cart to the database.
//!
//! Local storage always wins. A mirror write is queued after the local write and handled by
//! the cart sync subsystem; failures are retried a few times, logged and dropped.

use std::{
    collections::{HashMap, VecDeque, hash_map::Entry},
    sync::Arc,
};

use anyhow::Context;
use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use sqlx::{PgPool, types::Json};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, error, warn};

use super::{CartLine, UserId};

#[async_trait]
pub trait RemoteCartStore: Send + Sync {
    async fn save(&self, user_id: UserId, lines: &[CartLine]) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Clone)]
pub struct PgRemoteCartStore {
    pool: PgPool,
}

impl PgRemoteCartStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteCartStore for PgRemoteCartStore {
    async fn save(&self, user_id: UserId, lines: &[CartLine]) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"INSERT INTO user_carts (user_id, lines, updated_at)
               VALUES ($1, $2, now())
               ON CONFLICT (user_id)
                   DO UPDATE SET lines = EXCLUDED.lines, updated_at = now();"#,
        )
        .bind(user_id)
        .bind(Json(lines))
        .execute(&self.pool)
        .await
        .with_context(|| format!("Problem saving remote cart for user {user_id}."))?;
        Ok(())
    }
}

//------------------------ Sync queue ---------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CartSyncRequest {
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
}

/// Users waiting for a mirror write, oldest first, each with only their latest lines.
#[derive(Debug, Default)]
struct Pending {
    order: VecDeque<UserId>,
    latest: HashMap<UserId, Vec<CartLine>>,
}

/// Hand-off between cart mutations and the sync subsystem.
///
/// Requests coalesce per user: scheduling for a user who is already waiting replaces their
/// lines, so the mirror always ends on the newest local state. At most `capacity` users wait
/// at once; a request for one more user is dropped.
#[derive(Debug, Clone)]
pub struct CartSyncQueue {
    pending: Arc<Mutex<Pending>>,
    ready: Arc<Notify>,
    capacity: usize,
}

impl CartSyncQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: Arc::new(Mutex::new(Pending::default())),
            ready: Arc::new(Notify::new()),
            capacity: capacity.max(1),
        }
    }

    /// Queues a mirror write without waiting for it.
    pub async fn schedule(&self, request: CartSyncRequest) {
        let mut pending = self.pending.lock().await;
        let Pending { order, latest } = &mut *pending;
        match latest.entry(request.user_id) {
            Entry::Occupied(mut entry) => {
                entry.insert(request.lines);
            }
            Entry::Vacant(entry) => {
                if order.len() >= self.capacity {
                    warn!(
                        "CartSync: {} users already waiting, dropped cart sync for user {}",
                        order.len(),
                        request.user_id
                    );
                    return;
                }
                order.push_back(request.user_id);
                entry.insert(request.lines);
            }
        }
        drop(pending);
        self.ready.notify_one();
    }

    /// Takes the user who has waited longest, with their latest lines.
    pub(crate) async fn next(&self) -> Option<CartSyncRequest> {
        let mut pending = self.pending.lock().await;
        while let Some(user_id) = pending.order.pop_front() {
            if let Some(lines) = pending.latest.remove(&user_id) {
                return Some(CartSyncRequest { user_id, lines });
            }
        }
        None
    }

    /// Syncs every waiting user, including those scheduled while draining.
    pub async fn drain<R>(&self, remote: &R, max_retries: usize)
    where
        R: RemoteCartStore + ?Sized,
    {
        while let Some(request) = self.next().await {
            sync_cart(remote, &request, max_retries).await;
        }
    }

    /// Drains the queue whenever something is scheduled. Never returns.
    pub async fn run<R>(&self, remote: &R, max_retries: usize)
    where
        R: RemoteCartStore + ?Sized,
    {
        loop {
            self.drain(remote, max_retries).await;
            self.ready.notified().await;
        }
    }
}

pub async fn sync_cart<R>(remote: &R, request: &CartSyncRequest, max_retries: usize) -> bool
where
    R: RemoteCartStore + ?Sized,
{
    let user_id = request.user_id;
    let result = (|| async { remote.save(user_id, &request.lines).await })
        .retry(ExponentialBuilder::default().with_max_times(max_retries))
        .sleep(tokio::time::sleep)
        .notify(|err, dur| warn!("CartSync: retrying sync for user {user_id} after {dur:?}: {err:?}"))
        .await;

    match result {
        Ok(()) => {
            debug!("CartSync: synced {} lines for user {user_id}", request.lines.len());
            true
        }
        Err(err) => {
            error!("CartSync: giving up on cart sync for user {user_id}: {err:?}");
            false
        }
    }
}

//-------------------------- Tests -------------------------------
