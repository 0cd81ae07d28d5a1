use async_trait::async_trait;
use tokio::select;
use tokio_graceful_shutdown::{IntoSubsystem, SubsystemHandle};
use tracing::info;

use crate::{
    AppState,
    domain::cart::{CartSyncQueue, PgRemoteCartStore},
};

/// Mirrors owned carts to the database in the background.
pub struct CartSync {
    queue: CartSyncQueue,
    remote: PgRemoteCartStore,
    max_retries: usize,
}

impl CartSync {
    pub fn new(state: AppState) -> Self {
        Self {
            queue: state.cart_sync,
            remote: PgRemoteCartStore::new(state.pool),
            max_retries: state.settings.cart_sync.max_retries,
        }
    }
}

#[async_trait]
impl IntoSubsystem<anyhow::Error> for CartSync {
    async fn run(self, subsys: SubsystemHandle) -> Result<(), anyhow::Error> {
        info!("Cart sync starting.");
        select!(
            _ = self.queue.run(&self.remote, self.max_retries) => {}
            _ = subsys.on_shutdown_requested() => {
                // Flush whatever is still waiting, without retries.
                self.queue.drain(&self.remote, 0).await;
                info!("Cart sync shutdown.");
            }
        );
        Ok(())
    }
}
