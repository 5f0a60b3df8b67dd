//! Marketplace Sync Engine
//!
//! The client-side realtime reconciliation layer of the marketplace app. The server pushes asynchronous, possibly
//! duplicated and possibly out-of-order events about orders, shops and notifications. This library folds them into
//! local caches without losing or duplicating anything, and derives the seller's lifecycle state from the
//! authoritative shop status.
//!
//! The library is divided into these parts:
//! 1. The push channel manager ([`mod@push`]) owns the push sessions and hands every frame to its listeners, in order.
//! 2. The reconciliation orchestrator ([`mod@orchestrator`]) listens to all frames and routes them to
//!    * the buyer-side and shop-side order caches ([`mod@orders`]), which merge events into their records through the
//!      field-resolution utility in [`mod@merge`];
//!    * the notification feed ([`mod@notifications`]);
//!    * the shop lifecycle tracker ([`mod@shop`]), which is only ever updated from the authoritative endpoint.
//!
//! [`SyncEngine`] wires all of this together from a [`SyncConfig`]. Hosts can subscribe to lifecycle changes and
//! refresh failures through [`events::SyncHooks`].
mod config;
mod engine;
pub mod errors;
pub mod events;
mod helpers;
pub mod merge;
pub mod notifications;
pub mod orchestrator;
pub mod orders;
pub mod push;
pub mod shop;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use config::SyncConfig;
pub use engine::SyncEngine;
pub use errors::{ClassifyError, ConfigError, PushChannelError, SourceError, SyncError};
pub use orchestrator::{DispatchReport, ReconciliationOrchestrator};
