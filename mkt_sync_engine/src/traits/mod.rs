//! # Collaborator boundaries
//!
//! The sync engine does not talk to the network itself. Everything it needs from the outside world comes in through
//! the traits defined here, and hosts supply the implementations.
//!
//! * [`ShopStatusSource`] fetches the authoritative shop status tuple and the legacy shop record.
//! * [`CredentialSource`] reports the current push credential.
//! * [`crate::push::PushTransport`] (in the `push` module) opens the actual push sessions.
//!
//! The paged list types ([`Paginated`], [`Pagination`], [`PageRequest`]) are shared by the order caches and the
//! notification feed.
mod credential_source;
mod data_objects;
mod shop_status_source;

#[cfg(test)]
pub use credential_source::MockCredentialSource;
pub use credential_source::{CredentialSource, StaticCredential};
pub use data_objects::{PageRequest, Paginated, Pagination};
pub use shop_status_source::ShopStatusSource;
