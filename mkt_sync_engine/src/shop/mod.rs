//! Seller lifecycle tracking.
//!
//! [`lifecycle`] holds the pure state machine. [`ShopStatusTracker`] caches the data it is derived from and arbitrates
//! between overlapping refreshes, and [`ShopStatusRefresher`] runs those refreshes against a
//! [`crate::traits::ShopStatusSource`].
pub mod lifecycle;
mod refresher;
mod status_types;
mod tracker;

pub use lifecycle::{derive_status, RoutingDecision, RoutingFlags};
pub use refresher::ShopStatusRefresher;
pub use status_types::{
    AuthoritativeStatus,
    LegacyShop,
    LegacyShopStatus,
    ShopStatus,
    ShopStatusResponse,
    ShopSummary,
};
pub use tracker::{RefreshOutcome, RefreshTicket, ShopStatusTracker};
