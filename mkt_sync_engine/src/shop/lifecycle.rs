//! The shop lifecycle state machine.
//!
//! States are derived, never stored independently: [`derive_status`] maps the latest backing data onto a
//! [`ShopStatus`], and [`RoutingFlags::for_status`] maps that onto the screen the seller should see. Both functions
//! are pure and total.
use serde::{Deserialize, Serialize};

use crate::shop::{AuthoritativeStatus, LegacyShop, LegacyShopStatus, ShopStatus, ShopStatusResponse};

/// The shop's own status string that marks a suspension the seller can resolve.
pub const AWAITING_REMEDY: &str = "awaiting_remedy";

/// Derives the lifecycle state.
///
/// The authoritative tuple always wins. `fallback` is only consulted when there is no authoritative tuple, and `None`
/// there means the user has no shop at all.
pub fn derive_status(authoritative: Option<&ShopStatusResponse>, fallback: Option<&LegacyShop>) -> ShopStatus {
    match authoritative {
        Some(response) => from_authoritative(response),
        None => from_legacy(fallback),
    }
}

fn from_authoritative(response: &ShopStatusResponse) -> ShopStatus {
    let shop = response.shop.as_ref();
    match response.shop_status {
        AuthoritativeStatus::NotRegistered if shop.is_some() => ShopStatus::InformationInput,
        AuthoritativeStatus::NotRegistered => ShopStatus::PendingRegistration,
        AuthoritativeStatus::PendingReview => ShopStatus::PendingReview,
        AuthoritativeStatus::Approved if shop.is_some() => ShopStatus::SetupInProgress,
        AuthoritativeStatus::Approved => ShopStatus::Approved,
        AuthoritativeStatus::Rejected => ShopStatus::Rejected,
        AuthoritativeStatus::Active => ShopStatus::Active,
        AuthoritativeStatus::Suspended if shop.is_some_and(|s| s.status == AWAITING_REMEDY) => {
            ShopStatus::AwaitingRemedy
        },
        AuthoritativeStatus::Suspended => ShopStatus::Suspended,
        AuthoritativeStatus::Blocked => ShopStatus::Blocked,
    }
}

fn from_legacy(shop: Option<&LegacyShop>) -> ShopStatus {
    match shop.map(|s| s.status) {
        None => ShopStatus::PendingRegistration,
        Some(LegacyShopStatus::Pending) => ShopStatus::PendingReview,
        Some(LegacyShopStatus::Active) => ShopStatus::Active,
        Some(LegacyShopStatus::Blocked) => ShopStatus::Blocked,
    }
}

/// Which management screen to show. Exactly one flag is set for any [`ShopStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingFlags {
    pub show_registration: bool,
    pub show_information_input: bool,
    pub show_pending_review: bool,
    pub show_rejected: bool,
    pub show_setup: bool,
    pub show_dashboard: bool,
    pub show_suspended: bool,
    pub show_blocked: bool,
    pub show_awaiting_remedy: bool,
}

impl RoutingFlags {
    pub fn for_status(status: ShopStatus) -> Self {
        let mut flags = Self::default();
        match status {
            ShopStatus::PendingRegistration => flags.show_registration = true,
            ShopStatus::InformationInput => flags.show_information_input = true,
            // approved without a shop record shares the review screen
            ShopStatus::PendingReview | ShopStatus::Approved => flags.show_pending_review = true,
            ShopStatus::Rejected => flags.show_rejected = true,
            ShopStatus::SetupInProgress => flags.show_setup = true,
            ShopStatus::Active => flags.show_dashboard = true,
            ShopStatus::Suspended => flags.show_suspended = true,
            ShopStatus::Blocked => flags.show_blocked = true,
            ShopStatus::AwaitingRemedy => flags.show_awaiting_remedy = true,
        }
        flags
    }

    /// The number of flags that are set.
    pub fn asserted(&self) -> usize {
        [
            self.show_registration,
            self.show_information_input,
            self.show_pending_review,
            self.show_rejected,
            self.show_setup,
            self.show_dashboard,
            self.show_suspended,
            self.show_blocked,
            self.show_awaiting_remedy,
        ]
        .into_iter()
        .filter(|f| *f)
        .count()
    }
}

/// What the management console should render right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// No authoritative data yet and a fetch is in flight. No flag is asserted.
    Loading,
    Ready { status: ShopStatus, flags: RoutingFlags },
}

impl RoutingDecision {
    pub fn ready(status: ShopStatus) -> Self {
        Self::Ready { status, flags: RoutingFlags::for_status(status) }
    }

    pub fn status(&self) -> Option<ShopStatus> {
        match self {
            RoutingDecision::Loading => None,
            RoutingDecision::Ready { status, .. } => Some(*status),
        }
    }

    pub fn flags(&self) -> RoutingFlags {
        match self {
            RoutingDecision::Loading => RoutingFlags::default(),
            RoutingDecision::Ready { flags, .. } => *flags,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RoutingDecision::Loading)
    }
}
