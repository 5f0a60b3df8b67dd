//! # Reconciliation orchestrator
//!
//! The orchestrator is the only component that touches more than one cache. It subscribes to every push frame,
//! classifies it, and routes it:
//!
//! | `type`                                 | goes to                                   |
//! |----------------------------------------|-------------------------------------------|
//! | `order:new`, `order:customer:update`   | shop-side order cache                     |
//! | `order:placed`                         | buyer-side order cache                    |
//! | `order:status`                         | both order caches                         |
//! | `shop:*`                               | authoritative shop status refresh         |
//! | anything else                          | nowhere else                              |
//!
//! Every well-formed frame also lands in the notification feed, whichever channel it came from.
use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
};

use log::*;
use tokio::task::JoinHandle;

use crate::{
    config::SyncConfig,
    events::{EventProducers, InboundFrame, PushEnvelope, PushEvent},
    helpers::lock,
    notifications::{Notification, NotificationFeed},
    orders::{ApplyOutcome, OrderCache, OrderId, OrderRecord, OrderSide},
    push::{ListenerId, ListenerRegistry, PushChannelManager, ALL_EVENTS},
    shop::{RefreshOutcome, RoutingDecision, ShopStatus, ShopStatusRefresher},
    traits::{Paginated, ShopStatusSource},
};

/// What happened to a single push frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// The id of the feed entry for this frame.
    pub notification: Option<String>,
    pub orders: Vec<(OrderSide, ApplyOutcome)>,
    pub refresh_requested: bool,
}

#[derive(Clone)]
struct Caches {
    buyer_orders: Arc<Mutex<OrderCache>>,
    shop_orders: Arc<Mutex<OrderCache>>,
    feed: Arc<Mutex<NotificationFeed>>,
}

impl Caches {
    fn orders(&self, side: OrderSide) -> &Arc<Mutex<OrderCache>> {
        match side {
            OrderSide::Buyer => &self.buyer_orders,
            OrderSide::Shop => &self.shop_orders,
        }
    }
}

/// The state the push handler needs. Cheap to clone, so the handler can own a copy.
#[derive(Clone)]
struct Dispatcher {
    caches: Caches,
    refresher: ShopStatusRefresher,
    detached: Arc<AtomicBool>,
}

impl Dispatcher {
    fn dispatch(&self, frame: &InboundFrame) -> DispatchReport {
        let mut report = DispatchReport::default();
        if self.detached.load(Ordering::SeqCst) {
            trace!("🔀️ Detached. Ignoring '{}' frame", frame.event);
            return report;
        }
        let envelope = match PushEnvelope::from_frame(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("🔀️ Dropping frame from {}. {e}", frame.channel);
                return report;
            },
        };
        let notification = lock(&self.caches.feed).push(envelope.to_notification(frame.received_at));
        report.notification = Some(notification.id);
        let event = match PushEvent::classify(frame.channel, &envelope, frame.received_at) {
            Ok(event) => event,
            Err(e) => {
                warn!("🔀️ Not reconciling '{}'. {e}", envelope.kind);
                return report;
            },
        };
        match event {
            PushEvent::Order(event) => {
                for side in event.kind.sides() {
                    let mut cache = lock(self.caches.orders(*side));
                    let patch = event.patch(cache.aliases());
                    let outcome = cache.apply_patch(&event.order_id, None, &patch, event.occurred_at);
                    drop(cache);
                    debug!("🔀️ {} → {side} orders: {outcome:?}", event.order_id);
                    report.orders.push((*side, outcome));
                }
            },
            PushEvent::ShopChanged { action } => {
                debug!("🔀️ Shop {action}. Refreshing the shop status");
                // the tracker applies the result whenever it arrives
                report.refresh_requested = self.refresher.refresh().is_some();
            },
            PushEvent::Chat => trace!("🔀️ Chat notice added to the feed"),
            PushEvent::Notice => trace!("🔀️ '{}' notice added to the feed", envelope.kind),
        }
        report
    }
}

struct Attachment {
    listeners: ListenerRegistry,
    id: ListenerId,
}

/// Folds push events into the order caches, the notification feed and the shop status.
pub struct ReconciliationOrchestrator {
    dispatcher: Dispatcher,
    refresh_on_attach: bool,
    attachment: Mutex<Option<Attachment>>,
}

impl ReconciliationOrchestrator {
    pub fn new(config: &SyncConfig, source: Arc<dyn ShopStatusSource>, producers: EventProducers) -> Self {
        let caches = Caches {
            buyer_orders: Arc::new(Mutex::new(OrderCache::new(OrderSide::Buyer))),
            shop_orders: Arc::new(Mutex::new(OrderCache::new(OrderSide::Shop))),
            feed: Arc::new(Mutex::new(NotificationFeed::new(config.feed_capacity))),
        };
        let dispatcher = Dispatcher {
            caches,
            refresher: ShopStatusRefresher::new(source, producers),
            detached: Arc::new(AtomicBool::new(false)),
        };
        Self { dispatcher, refresh_on_attach: config.refresh_on_attach, attachment: Mutex::new(None) }
    }

    /// Subscribes to every frame the manager receives. Attaching twice keeps the first subscription.
    ///
    /// Unless disabled in the configuration, this also kicks off the initial shop status refresh and the legacy shop
    /// record load.
    pub fn attach(&self, manager: &PushChannelManager) -> ListenerId {
        let mut attachment = lock(&self.attachment);
        if let Some(existing) = attachment.as_ref() {
            debug!("🔀️ Already attached as {}", existing.id);
            return existing.id;
        }
        let dispatcher = self.dispatcher.clone();
        let id = manager.on(
            ALL_EVENTS,
            Arc::new(move |frame: InboundFrame| {
                let dispatcher = dispatcher.clone();
                Box::pin(async move {
                    dispatcher.dispatch(&frame);
                }) as Pin<Box<dyn Future<Output = ()> + Send>>
            }),
        );
        *attachment = Some(Attachment { listeners: manager.listeners(), id });
        info!("🔀️ Orchestrator attached as {id}");
        if self.refresh_on_attach {
            drop(self.dispatcher.refresher.load_fallback());
            drop(self.dispatcher.refresher.refresh());
        }
        id
    }

    /// Unsubscribes from the push channel manager and stops all further cache mutation. Refreshes already in flight
    /// are not cancelled, but their responses are thrown away.
    pub fn detach(&self) -> bool {
        self.dispatcher.detached.store(true, Ordering::SeqCst);
        self.dispatcher.refresher.detach();
        match lock(&self.attachment).take() {
            Some(Attachment { listeners, id }) => {
                listeners.remove(ALL_EVENTS, id);
                info!("🔀️ Orchestrator detached");
                true
            },
            None => false,
        }
    }

    pub fn is_detached(&self) -> bool {
        self.dispatcher.detached.load(Ordering::SeqCst)
    }

    /// Reconciles a single frame directly, without going through a push channel.
    pub fn dispatch(&self, frame: &InboundFrame) -> DispatchReport {
        self.dispatcher.dispatch(frame)
    }

    /// Refreshes the shop status. Call this whenever the seller navigates into the management console.
    ///
    /// Returns `None`, and refreshes nothing, if there is no tokio runtime to run the request on.
    pub fn refresh_shop_status(&self) -> Option<JoinHandle<RefreshOutcome>> {
        self.dispatcher.refresher.refresh()
    }

    pub fn load_legacy_shop(&self) -> Option<JoinHandle<()>> {
        self.dispatcher.refresher.load_fallback()
    }

    pub fn shop_status(&self) -> Option<ShopStatus> {
        self.dispatcher.refresher.status()
    }

    pub fn routing(&self) -> RoutingDecision {
        self.dispatcher.refresher.routing()
    }

    //-------------------------------------------  Orders  -----------------------------------------------------------

    /// Seeds an order cache from an authoritative list fetch. Returns the number of orders added.
    pub fn load_orders(&self, side: OrderSide, page: Paginated<OrderRecord>) -> usize {
        if self.is_detached() {
            return 0;
        }
        lock(self.dispatcher.caches.orders(side)).load_page(page)
    }

    /// A snapshot of the orders on one side, in list order.
    pub fn orders(&self, side: OrderSide) -> Vec<OrderRecord> {
        lock(self.dispatcher.caches.orders(side)).records().to_vec()
    }

    pub fn order(&self, side: OrderSide, id: &OrderId) -> Option<OrderRecord> {
        lock(self.dispatcher.caches.orders(side)).get(id).cloned()
    }

    //---------------------------------------  Notifications  ---------------------------------------------------------

    pub fn load_notifications(&self, page: Paginated<Notification>) -> usize {
        if self.is_detached() {
            return 0;
        }
        lock(&self.dispatcher.caches.feed).load_page(page)
    }

    /// A snapshot of the feed, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        lock(&self.dispatcher.caches.feed).iter().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        lock(&self.dispatcher.caches.feed).unread_count()
    }

    pub fn mark_read(&self, id: &str) -> bool {
        lock(&self.dispatcher.caches.feed).mark_read(id)
    }

    pub fn mark_all_read(&self) -> usize {
        lock(&self.dispatcher.caches.feed).mark_all_read()
    }

    pub fn clear_notifications(&self) {
        lock(&self.dispatcher.caches.feed).clear();
    }
}
