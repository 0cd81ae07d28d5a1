mod book;
mod saved_addresses;

pub use book::{AddressBook, AddressId, PgAddressBook, SavedAddress, SharedAddressBook, ShippingAddress};
pub use saved_addresses::{list_addresses_endpoint, set_default_address_endpoint};

#[cfg(test)]
pub(crate) use book::tests::{MemoryAddressBook, address};
