use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
    Mutex,
};

use chrono::Utc;
use log::*;
use tokio::{runtime::Handle, task::JoinHandle};

use crate::{
    events::{EventProducers, LifecycleChangedEvent, RefreshFailedEvent},
    helpers::lock,
    shop::{RefreshOutcome, RoutingDecision, RoutingFlags, ShopStatus, ShopStatusTracker},
    traits::ShopStatusSource,
};

/// Runs shop status fetches on their own tasks and feeds the results into a shared [`ShopStatusTracker`].
///
/// Once [`ShopStatusRefresher::detach`] has been called, responses that are still in flight are dropped on arrival.
/// The requests themselves are not cancelled.
///
/// Fetches run on the caller's tokio runtime, or else on the runtime the refresher was created on. With neither,
/// nothing is fetched.
#[derive(Clone)]
pub struct ShopStatusRefresher {
    source: Arc<dyn ShopStatusSource>,
    tracker: Arc<Mutex<ShopStatusTracker>>,
    detached: Arc<AtomicBool>,
    producers: EventProducers,
    runtime: Option<Handle>,
}

impl ShopStatusRefresher {
    pub fn new(source: Arc<dyn ShopStatusSource>, producers: EventProducers) -> Self {
        Self {
            source,
            tracker: Arc::new(Mutex::new(ShopStatusTracker::new())),
            detached: Arc::new(AtomicBool::new(false)),
            producers,
            runtime: Handle::try_current().ok(),
        }
    }

    fn runtime(&self) -> Option<Handle> {
        Handle::try_current().ok().or_else(|| self.runtime.clone())
    }

    /// Starts an authoritative refresh. The ticket is issued immediately, so the order of calls decides which response
    /// wins, not the order in which responses arrive.
    pub fn refresh(&self) -> Option<JoinHandle<RefreshOutcome>> {
        let Some(runtime) = self.runtime() else {
            warn!("🏪️ No tokio runtime to fetch the shop status on. Skipping the refresh");
            return None;
        };
        let ticket = lock(&self.tracker).begin_refresh();
        let source = Arc::clone(&self.source);
        let tracker = Arc::clone(&self.tracker);
        let detached = Arc::clone(&self.detached);
        let producers = self.producers.clone();
        let task = runtime.spawn(async move {
            let result = source.fetch_shop_status().await;
            if detached.load(Ordering::SeqCst) {
                debug!("🏪️ Dropping shop status response #{}. The engine has detached", ticket.value());
                lock(&tracker).abandon_refresh(ticket);
                return RefreshOutcome::Discarded;
            }
            let outcome = lock(&tracker).complete_refresh(ticket, result);
            match &outcome {
                RefreshOutcome::Applied { previous, current } if outcome.changed() => {
                    let event = LifecycleChangedEvent {
                        previous: *previous,
                        current: *current,
                        routing: RoutingFlags::for_status(*current),
                    };
                    producers.publish_lifecycle_changed(event).await;
                },
                RefreshOutcome::Failed(e) => {
                    let event = RefreshFailedEvent { reason: e.to_string(), failed_at: Utc::now() };
                    producers.publish_refresh_failed(event).await;
                },
                _ => {},
            }
            outcome
        });
        Some(task)
    }

    /// Loads the legacy shop record, which stands in for the authoritative status until that has loaded once.
    pub fn load_fallback(&self) -> Option<JoinHandle<()>> {
        let Some(runtime) = self.runtime() else {
            warn!("🏪️ No tokio runtime to fetch the legacy shop record on. Skipping it");
            return None;
        };
        lock(&self.tracker).begin_fallback_load();
        let source = Arc::clone(&self.source);
        let tracker = Arc::clone(&self.tracker);
        let detached = Arc::clone(&self.detached);
        let task = runtime.spawn(async move {
            let result = source.fetch_legacy_shop().await;
            if detached.load(Ordering::SeqCst) {
                debug!("🏪️ Dropping legacy shop record. The engine has detached");
                return;
            }
            lock(&tracker).load_fallback(result);
        });
        Some(task)
    }

    pub fn detach(&self) {
        self.detached.store(true, Ordering::SeqCst);
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> Option<ShopStatus> {
        lock(&self.tracker).status()
    }

    pub fn routing(&self) -> RoutingDecision {
        lock(&self.tracker).routing()
    }
}
