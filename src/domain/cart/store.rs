//! Cart sessions and the registry that owns them.

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, warn};

use crate::domain::pricing::{OrderSummary, PromoCode};

use super::{Cart, CartError, CartId, CartLine, CartStorage, CartSyncQueue, CartSyncRequest, UserId};

const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// One browsing session's cart plus the session-scoped extras around it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartStore {
    pub(super) cart_id: CartId,
    pub(super) cart: Cart,
    pub(super) promo_code: Option<PromoCode>,
    pub(super) owner: Option<UserId>,
}

impl CartStore {
    pub fn new(cart_id: CartId, cart: Cart) -> Self {
        Self {
            cart_id,
            cart,
            promo_code: None,
            owner: None,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn promo_code(&self) -> Option<PromoCode> {
        self.promo_code
    }

    pub fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Full precision summary of the current lines.
    pub fn summary(&self) -> Result<OrderSummary, CartError> {
        OrderSummary::for_lines(self.cart.lines(), self.promo_code)
    }

    /// Empties the cart. The promo code goes with it.
    pub fn clear(&mut self) {
        self.cart.clear();
        self.promo_code = None;
    }
}

/// What checkout needs to know about a cart at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub promo_code: Option<PromoCode>,
    pub owner: Option<UserId>,
}

impl CartSnapshot {
    pub fn summary(&self) -> Result<OrderSummary, CartError> {
        OrderSummary::for_lines(&self.lines, self.promo_code)
    }
}

struct Session {
    store: CartStore,
    last_touched: Instant,
}

impl Session {
    fn new(store: CartStore) -> Self {
        Self {
            store,
            last_touched: Instant::now(),
        }
    }
}

struct Sessions {
    carts: HashMap<CartId, Session>,
    last_pruned: Instant,
}

/// Handle to every live cart session.
///
/// A session is read from local storage the first time its cart is touched and written back
/// after every mutation. Mutations across all sessions are serialized by one lock. Storage
/// failures never fail a cart operation; the in-memory cart stays authoritative.
///
/// Reading a cart that has nothing stored does not open a session. Sessions idle for longer
/// than the idle timeout are dropped; their lines come back from local storage, their promo
/// code and owner do not.
#[derive(Clone)]
pub struct CartRegistry {
    sessions: Arc<Mutex<Sessions>>,
    storage: Arc<dyn CartStorage>,
    sync: CartSyncQueue,
    idle_timeout: Duration,
}

impl CartRegistry {
    pub fn new(storage: Arc<dyn CartStorage>, sync: CartSyncQueue) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Sessions {
                carts: HashMap::new(),
                last_pruned: Instant::now(),
            })),
            storage,
            sync,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Runs `op` against the session. When it succeeds and the result can still be priced,
    /// the new state is persisted locally and, for an owned cart, queued for remote sync.
    /// Otherwise the session is left as it was.
    pub async fn update<F>(&self, cart_id: CartId, op: F) -> Result<CartView, CartError>
    where
        F: FnOnce(&mut CartStore) -> Result<(), CartError>,
    {
        let mut sessions = self.sessions.lock().await;
        self.prune_idle(&mut sessions);
        let store = self.session(&mut sessions, cart_id).await;

        let before = store.clone();
        match op(&mut *store).and_then(|()| store.view()) {
            Ok(view) => {
                self.persist(store).await;
                Ok(view)
            }
            Err(err) => {
                *store = before;
                Err(err)
            }
        }
    }

    pub async fn view(&self, cart_id: CartId) -> Result<CartView, CartError> {
        self.read(cart_id, CartStore::view).await
    }

    pub async fn snapshot(&self, cart_id: CartId) -> CartSnapshot {
        self.read(cart_id, |store| CartSnapshot {
            lines: store.cart.lines().to_vec(),
            promo_code: store.promo_code,
            owner: store.owner,
        })
        .await
    }

    pub async fn clear(&self, cart_id: CartId) {
        let mut sessions = self.sessions.lock().await;
        self.prune_idle(&mut sessions);
        let store = self.session(&mut sessions, cart_id).await;
        store.clear();
        self.persist(store).await;
    }

    async fn read<T>(&self, cart_id: CartId, f: impl FnOnce(&CartStore) -> T) -> T {
        let mut sessions = self.sessions.lock().await;
        self.prune_idle(&mut sessions);
        if let Some(session) = sessions.carts.get_mut(&cart_id) {
            session.last_touched = Instant::now();
            return f(&session.store);
        }

        match self.load(cart_id).await {
            Some(store) => f(&sessions.carts.entry(cart_id).or_insert(Session::new(store)).store),
            None => f(&CartStore::new(cart_id, Cart::default())),
        }
    }

    async fn session<'a>(&self, sessions: &'a mut Sessions, cart_id: CartId) -> &'a mut CartStore {
        let session = match sessions.carts.entry(cart_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let store = self
                    .load(cart_id)
                    .await
                    .unwrap_or_else(|| CartStore::new(cart_id, Cart::default()));
                entry.insert(Session::new(store))
            }
        };
        session.last_touched = Instant::now();
        &mut session.store
    }

    fn prune_idle(&self, sessions: &mut Sessions) {
        let now = Instant::now();
        if now.duration_since(sessions.last_pruned) < self.idle_timeout {
            return;
        }
        sessions.last_pruned = now;

        let before = sessions.carts.len();
        sessions
            .carts
            .retain(|_, session| now.duration_since(session.last_touched) < self.idle_timeout);
        let dropped = before - sessions.carts.len();
        if dropped > 0 {
            debug!("Carts: dropped {dropped} idle sessions");
        }
    }

    /// `None` when nothing is stored for the cart or the stored cart cannot be read.
    async fn load(&self, cart_id: CartId) -> Option<CartStore> {
        match self.storage.load(cart_id).await {
            Ok(lines) => lines.map(|lines| CartStore::new(cart_id, Cart::from_lines(lines))),
            Err(err) => {
                warn!("Cart {cart_id}: stored cart could not be read, starting empty: {err:?}");
                None
            }
        }
    }

    async fn persist(&self, store: &CartStore) {
        let lines = store.cart.lines();
        if let Err(err) = self.storage.save(store.cart_id, lines).await {
            warn!("Cart {}: local save failed: {err:?}", store.cart_id);
        }
        if let Some(user_id) = store.owner {
            self.sync
                .schedule(CartSyncRequest {
                    user_id,
                    lines: lines.to_vec(),
                })
                .await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn session_count(&self) -> usize {
        self.sessions.lock().await.carts.len()
    }
}

/// The cart as returned to clients, with every amount rounded for display.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CartView {
    pub cart_id: CartId,
    pub lines: Vec<CartLine>,
    pub item_count: u32,
    pub promo_code: Option<PromoCode>,
    pub summary: OrderSummary,
}

impl CartStore {
    pub fn view(&self) -> Result<CartView, CartError> {
        Ok(CartView {
            cart_id: self.cart_id,
            lines: self.cart.lines().to_vec(),
            item_count: self.cart.item_count(),
            promo_code: self.promo_code,
            summary: self.summary()?.rounded(),
        })
    }
}

//-------------------------- Tests -------------------------------
