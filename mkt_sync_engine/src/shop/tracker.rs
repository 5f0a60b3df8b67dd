use std::collections::BTreeSet;

use log::*;

use crate::{
    errors::SourceError,
    shop::{derive_status, LegacyShop, RoutingDecision, ShopStatus, ShopStatusResponse},
};

/// Issued for every authoritative refresh, in the order the refreshes were requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was stored. `previous` is the lifecycle state before it was applied.
    Applied { previous: Option<ShopStatus>, current: ShopStatus },
    /// A response to a later request has already been applied, so this one was thrown away.
    Stale,
    /// The fetch failed. The last known state is kept.
    Failed(SourceError),
    /// The owner detached before the response arrived.
    Discarded,
}

impl RefreshOutcome {
    /// True if the lifecycle state moved as a result of this refresh.
    pub fn changed(&self) -> bool {
        matches!(self, RefreshOutcome::Applied { previous, current } if *previous != Some(*current))
    }
}

/// Owns the cached shop status and decides which refresh responses get to update it.
///
/// Refreshes can overlap (a `shop:*` push event arriving mid-refresh starts another one), and responses can arrive in
/// any order. Each refresh is issued a [`RefreshTicket`]; a response is only applied if no response to a later ticket
/// has been applied yet.
#[derive(Debug, Default)]
pub struct ShopStatusTracker {
    authoritative: Option<ShopStatusResponse>,
    // outer None: never loaded, inner None: the user has no shop
    fallback: Option<Option<LegacyShop>>,
    next_ticket: u64,
    newest_applied: Option<RefreshTicket>,
    in_flight: BTreeSet<RefreshTicket>,
    fallback_in_flight: bool,
}

impl ShopStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.next_ticket += 1;
        let ticket = RefreshTicket(self.next_ticket);
        self.in_flight.insert(ticket);
        trace!("🏪️ Shop status refresh #{} started", ticket.0);
        ticket
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<ShopStatusResponse, SourceError>,
    ) -> RefreshOutcome {
        self.in_flight.remove(&ticket);
        if self.newest_applied.is_some_and(|newest| newest > ticket) {
            debug!("🏪️ Discarding shop status response #{}. A newer response has already been applied", ticket.0);
            return RefreshOutcome::Stale;
        }
        match result {
            Ok(response) => {
                let previous = self.status();
                self.authoritative = Some(response);
                self.newest_applied = Some(ticket);
                let current = derive_status(self.authoritative.as_ref(), None);
                if previous != Some(current) {
                    info!("🏪️ Shop lifecycle is now {current}");
                }
                RefreshOutcome::Applied { previous, current }
            },
            Err(e) => {
                warn!("🏪️ Could not refresh the shop status. {e}");
                RefreshOutcome::Failed(e)
            },
        }
    }

    /// Forgets an in-flight refresh whose response will never be applied.
    pub fn abandon_refresh(&mut self, ticket: RefreshTicket) {
        self.in_flight.remove(&ticket);
    }

    pub fn begin_fallback_load(&mut self) {
        self.fallback_in_flight = true;
    }

    /// Stores the legacy shop record. It only affects the lifecycle state while no authoritative response exists.
    pub fn load_fallback(&mut self, result: Result<Option<LegacyShop>, SourceError>) {
        self.fallback_in_flight = false;
        match result {
            Ok(shop) => {
                if self.authoritative.is_some() {
                    trace!("🏪️ Legacy shop record loaded, but the authoritative status is already known");
                }
                self.fallback = Some(shop);
            },
            Err(e) => warn!("🏪️ Could not load the legacy shop record. {e}"),
        }
    }

    /// The current lifecycle state, or `None` if nothing has been loaded yet.
    pub fn status(&self) -> Option<ShopStatus> {
        match (&self.authoritative, &self.fallback) {
            (Some(response), _) => Some(derive_status(Some(response), None)),
            (None, Some(fallback)) => Some(derive_status(None, fallback.as_ref())),
            (None, None) => None,
        }
    }

    /// The routing decision for the management console.
    ///
    /// Until the authoritative tuple has loaded once, any fetch in flight means [`RoutingDecision::Loading`].
    /// After that the last known state is always shown, even while a refresh is running or after one failed.
    pub fn routing(&self) -> RoutingDecision {
        let fetching = !self.in_flight.is_empty() || self.fallback_in_flight;
        if self.authoritative.is_none() && fetching {
            return RoutingDecision::Loading;
        }
        match self.status() {
            Some(status) => RoutingDecision::ready(status),
            None => RoutingDecision::Loading,
        }
    }

    pub fn authoritative(&self) -> Option<&ShopStatusResponse> {
        self.authoritative.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        !self.in_flight.is_empty()
    }
}
