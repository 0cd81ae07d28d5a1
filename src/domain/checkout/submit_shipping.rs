//! Submit Shipping slice

use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
};
use disintegrate::Decision;
use tracing::warn;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{
        DecisionMaker, DomainEvent, EventStore,
        addresses::{AddressBook, AddressId, SharedAddressBook, ShippingAddress},
        cart::UserId,
    },
    infra::ClientError,
};

use super::{
    CheckoutError, CheckoutId, CheckoutProgress, CheckoutStep, CheckoutView, Contact,
    ShippingDetails, load_checkout,
};

//------------------------- Web API ----------------------------

#[derive(Debug, Clone, serde::Serialize)]
pub struct ShippingAccepted {
    pub checkout: CheckoutView,
    /// Set when the address could not be saved to the user's address book. Checkout goes on.
    pub notice: Option<String>,
}

pub async fn submit_shipping_endpoint(
    State(decider): State<DecisionMaker>,
    State(event_store): State<EventStore>,
    State(addresses): State<SharedAddressBook>,
    Path(checkout_uuid): Path<Uuid>,
    Json(details): Json<ShippingDetails>,
) -> Result<Json<ShippingAccepted>, ClientError> {
    let checkout_id: CheckoutId = checkout_uuid.try_into()?;
    details.validate()?;

    // Checked before touching the address book so a stale form does not save an address.
    let checkout = load_checkout(&event_store, checkout_id).await?;
    if checkout.exited_to.is_some() {
        return Err(CheckoutError::CheckoutClosed(checkout_id).into());
    }
    if checkout.step != CheckoutStep::Shipping {
        return Err(CheckoutError::WrongStep {
            expected: CheckoutStep::Shipping,
            actual: checkout.step,
        }
        .into());
    }

    let resolved = resolve_address(
        addresses.as_ref(),
        checkout.user_id,
        details.address_id,
        details.address(),
    )
    .await?;

    decider
        .make(SubmitShippingCommand {
            checkout_id,
            contact: details.contact(),
            address: resolved.address,
            address_id: resolved.address_id,
        })
        .await?;

    Ok(Json(ShippingAccepted {
        checkout: load_checkout(&event_store, checkout_id).await?,
        notice: resolved.notice,
    }))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddress {
    pub address: ShippingAddress,
    pub address_id: Option<AddressId>,
    pub notice: Option<String>,
}

/// Picks the address book entry an order will reference. A chosen entry must belong to the
/// user and its stored fields are used. Otherwise the entered address is saved, or matched
/// to an identical saved one. Guests get no entry.
pub async fn resolve_address(
    addresses: &dyn AddressBook,
    user_id: Option<UserId>,
    chosen: Option<AddressId>,
    entered: ShippingAddress,
) -> Result<ResolvedAddress, ClientError> {
    let not_found =
        |address_id: AddressId| ClientError::NotFound(format!("Address {address_id} does not exist."));

    match (user_id, chosen) {
        (None, Some(address_id)) => Err(not_found(address_id)),
        (None, None) => Ok(ResolvedAddress {
            address: entered,
            address_id: None,
            notice: None,
        }),
        (Some(user_id), Some(address_id)) => {
            let saved = addresses
                .list(user_id)
                .await
                .with_context(|| format!("Problem reading addresses of user {user_id}."))?
                .into_iter()
                .find(|saved| saved.address_id == address_id)
                .ok_or_else(|| not_found(address_id))?;
            Ok(ResolvedAddress {
                address: saved.address,
                address_id: Some(address_id),
                notice: None,
            })
        }
        (Some(user_id), None) => match addresses.find_or_save(user_id, &entered).await {
            Ok(saved) => Ok(ResolvedAddress {
                address: entered,
                address_id: Some(saved.address_id),
                notice: None,
            }),
            Err(err) => {
                warn!("Address for user {user_id} could not be saved: {err:?}");
                Ok(ResolvedAddress {
                    address: entered,
                    address_id: None,
                    notice: Some("Your address could not be saved for next time.".to_owned()),
                })
            }
        },
    }
}

//------------------------- Command ----------------------------

#[derive(Debug, Clone)]
pub struct SubmitShippingCommand {
    pub checkout_id: CheckoutId,
    pub contact: Contact,
    pub address: ShippingAddress,
    pub address_id: Option<AddressId>,
}

impl Decision for SubmitShippingCommand {
    type Event = DomainEvent;
    type StateQuery = CheckoutProgress;
    type Error = CheckoutError;

    fn state_query(&self) -> Self::StateQuery {
        CheckoutProgress::new(self.checkout_id)
    }

    fn process(&self, state: &Self::StateQuery) -> Result<Vec<Self::Event>, Self::Error> {
        state.ensure_step(CheckoutStep::Shipping)?;

        Ok(vec![DomainEvent::ShippingDetailsAccepted {
            checkout_id: self.checkout_id,
            contact: self.contact.clone(),
            address: self.address.clone(),
            address_id: self.address_id,
        }])
    }
}

//-------------------------- Tests -------------------------------

#[cfg(test)]
mod tests {
    use disintegrate::TestHarness;

    use crate::domain::{
        addresses::{MemoryAddressBook, address},
        cart::CartId,
        checkout::{Destination, draft::tests::valid_shipping},
    };

    use super::*;

    fn started(checkout_id: CheckoutId) -> DomainEvent {
        DomainEvent::CheckoutStarted {
            checkout_id,
            cart_id: CartId::new(),
            user_id: None,
        }
    }

    fn command(checkout_id: CheckoutId) -> SubmitShippingCommand {
        let details = valid_shipping();
        SubmitShippingCommand {
            checkout_id,
            contact: details.contact(),
            address: details.address(),
            address_id: None,
        }
    }

    #[test]
    fn shipping_details_move_checkout_to_payment() {
        let checkout_id = CheckoutId::new();
        let details = valid_shipping();

        TestHarness::given([started(checkout_id)])
            .when(command(checkout_id))
            .then([DomainEvent::ShippingDetailsAccepted {
                checkout_id,
                contact: details.contact(),
                address: details.address(),
                address_id: None,
            }])
    }

    #[test]
    fn shipping_cannot_be_resubmitted_from_payment() {
        let checkout_id = CheckoutId::new();
        let accepted = command(checkout_id);

        TestHarness::given([
            started(checkout_id),
            DomainEvent::ShippingDetailsAccepted {
                checkout_id,
                contact: accepted.contact.clone(),
                address: accepted.address.clone(),
                address_id: None,
            },
        ])
        .when(command(checkout_id))
        .then_err(CheckoutError::WrongStep {
            expected: CheckoutStep::Shipping,
            actual: CheckoutStep::Payment,
        })
    }

    #[test]
    fn unknown_checkout_is_rejected() {
        let checkout_id = CheckoutId::new();

        TestHarness::given([])
            .when(command(checkout_id))
            .then_err(CheckoutError::CheckoutDoesNotExist(checkout_id))
    }

    #[test]
    fn exited_checkout_is_rejected() {
        let checkout_id = CheckoutId::new();

        TestHarness::given([
            started(checkout_id),
            DomainEvent::CheckoutExited {
                checkout_id,
                destination: Destination::Cart,
            },
        ])
        .when(command(checkout_id))
        .then_err(CheckoutError::CheckoutClosed(checkout_id))
    }

    async fn resolve_entered(book: &MemoryAddressBook, user_id: Option<UserId>) -> ResolvedAddress {
        resolve_address(book, user_id, None, valid_shipping().address())
            .await
            .expect("Entered address should resolve.")
    }

    #[tokio::test]
    async fn first_address_is_saved_and_reused_afterwards() {
        let book = MemoryAddressBook::default();
        let user_id = UserId::new();

        let first = resolve_entered(&book, Some(user_id)).await;
        let second = resolve_entered(&book, Some(user_id)).await;

        assert!(first.address_id.is_some());
        assert_eq!(first.notice, None);
        assert_eq!(first.address_id, second.address_id);
        assert_eq!(book.list(user_id).await.expect("List should succeed.").len(), 1);
    }

    #[tokio::test]
    async fn edited_address_is_saved_instead_of_the_default() {
        let book = MemoryAddressBook::default();
        let user_id = UserId::new();
        let home = book
            .save(user_id, &address("1 Main Street"))
            .await
            .expect("Save should succeed.");

        let resolved = resolve_entered(&book, Some(user_id)).await;

        let edited = resolved.address_id.expect("Edited address should be saved.");
        assert_ne!(edited, home.address_id);
        assert_eq!(resolved.address, valid_shipping().address());
        let saved = book.list(user_id).await.expect("List should succeed.");
        assert_eq!(saved[0].address_id, home.address_id);
        assert_eq!(
            saved.iter().find(|saved| saved.address_id == edited).map(|saved| &saved.address),
            Some(&valid_shipping().address())
        );
    }

    #[tokio::test]
    async fn chosen_address_is_used_as_saved() {
        let book = MemoryAddressBook::default();
        let user_id = UserId::new();
        book.save(user_id, &address("1 Main Street")).await.expect("Save should succeed.");
        let office = book
            .save(user_id, &address("9 Office Park"))
            .await
            .expect("Save should succeed.");

        let resolved = resolve_address(
            &book,
            Some(user_id),
            Some(office.address_id),
            valid_shipping().address(),
        )
        .await
        .expect("Chosen address should resolve.");

        assert_eq!(resolved.address_id, Some(office.address_id));
        assert_eq!(resolved.address, address("9 Office Park"));
    }

    #[tokio::test]
    async fn another_users_address_cannot_be_chosen() {
        let book = MemoryAddressBook::default();
        let owner = UserId::new();
        let saved = book
            .save(owner, &address("1 Main Street"))
            .await
            .expect("Save should succeed.");

        let other_user =
            resolve_address(&book, Some(UserId::new()), Some(saved.address_id), address("x")).await;
        let guest = resolve_address(&book, None, Some(saved.address_id), address("x")).await;

        assert!(matches!(other_user, Err(ClientError::NotFound(_))));
        assert!(matches!(guest, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn guests_get_no_address_entry() {
        let book = MemoryAddressBook::default();

        let resolved = resolve_entered(&book, None).await;

        assert_eq!(resolved.address_id, None);
        assert_eq!(resolved.notice, None);
    }

    #[tokio::test]
    async fn address_book_failure_becomes_a_notice() {
        let book = MemoryAddressBook {
            failing: true,
            ..Default::default()
        };

        let resolved = resolve_entered(&book, Some(UserId::new())).await;

        assert_eq!(resolved.address_id, None);
        assert!(resolved.notice.is_some());
    }
}
