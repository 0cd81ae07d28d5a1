//! Start Checkout slice

use axum::{Json, extract::State};
use disintegrate::Decision;
use tracing::warn;
use uuid::Uuid;

use crate::{
    domain::{
        DecisionMaker, DomainEvent, EventStore,
        addresses::{SavedAddress, SharedAddressBook},
        cart::{CartId, CartRegistry, CartView, UserId},
    },
    infra::ClientError,
};

use super::{CheckoutError, CheckoutId, CheckoutProgress, CheckoutView, load_checkout};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Deserialize)]
pub struct StartCheckoutPayload {
    pub checkout_id: Uuid,
    pub cart_id: Uuid,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct StartCheckoutResponse {
    pub checkout: CheckoutView,
    pub cart: CartView,
    /// Pre-fill for the shipping form.
    pub saved_address: Option<SavedAddress>,
}

pub async fn start_checkout_endpoint(
    State(decider): State<DecisionMaker>,
    State(event_store): State<EventStore>,
    State(carts): State<CartRegistry>,
    State(addresses): State<SharedAddressBook>,
    Json(payload): Json<StartCheckoutPayload>,
) -> Result<Json<StartCheckoutResponse>, ClientError> {
    let checkout_id: CheckoutId = payload.checkout_id.try_into()?;
    let cart_id: CartId = payload.cart_id.try_into()?;
    let user_id = payload.user_id.map(UserId::try_from).transpose()?;

    let cart = carts.snapshot(cart_id).await;
    let user_id = user_id.or(cart.owner);

    decider
        .make(StartCheckoutCommand {
            checkout_id,
            cart_id,
            user_id,
            item_count: cart.lines.len(),
        })
        .await?;

    let saved_address = match user_id {
        Some(user_id) => addresses.default_for(user_id).await.unwrap_or_else(|err| {
            warn!("Checkout {checkout_id}: saved address lookup failed: {err:?}");
            None
        }),
        None => None,
    };

    Ok(Json(StartCheckoutResponse {
        checkout: load_checkout(&event_store, checkout_id).await?,
        cart: carts.view(cart_id).await?,
        saved_address,
    }))
}

//------------------------- Command ----------------------------

#[derive(Debug, Clone)]
pub struct StartCheckoutCommand {
    pub checkout_id: CheckoutId,
    pub cart_id: CartId,
    pub user_id: Option<UserId>,
    pub item_count: usize,
}

impl Decision for StartCheckoutCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        if state.has_started() {
            return Err(CheckoutError::IdConsumed(self.checkout_id));
        }
        if self.item_count == 0 {
            return Err(CheckoutError::EmptyCart);
        }

        Ok(vec![DomainEvent::CheckoutStarted {
            checkout_id: self.checkout_id,
            cart_id: self.cart_id,
            user_id: self.user_id,
        }])
    }
}

//-------------------------- Tests -------------------------------
