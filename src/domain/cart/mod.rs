mod add_item;
mod apply_promo;
mod attach_owner;
mod cart_view;
mod errors;
mod ids;
mod lines;
mod remote_sync;
mod remove_item;
mod storage;
mod store;
mod update_quantity;

pub use add_item::{AddItemPayload, ProductSelection, add_item_endpoint};
pub use apply_promo::{PromoPayload, apply_promo_endpoint};
pub use attach_owner::{AttachOwnerPayload, attach_owner_endpoint};
pub use cart_view::cart_view_endpoint;
pub use errors::CartError;
pub use ids::*;
pub use lines::{Cart, CartLine, LineKey, check_price, max_price, sum_lines};
pub use remote_sync::{
    CartSyncQueue, CartSyncRequest, PgRemoteCartStore, RemoteCartStore, sync_cart,
};
pub use remove_item::{LinePayload, remove_item_endpoint};
pub use storage::{CartStorage, FileCartStorage, StorageError};
pub use store::{CartRegistry, CartSnapshot, CartStore, CartView};
pub use update_quantity::{QuantityUpdate, UpdateQuantityPayload, update_quantity_endpoint};

#[cfg(test)]
pub(crate) use store::tests::MemoryStorage;
