use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::events::{EventHandler, EventProducer, Handler, LifecycleChangedEvent, RefreshFailedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub lifecycle_changed_producer: Vec<EventProducer<LifecycleChangedEvent>>,
    pub refresh_failed_producer: Vec<EventProducer<RefreshFailedEvent>>,
}

impl EventProducers {
    pub async fn publish_lifecycle_changed(&self, event: LifecycleChangedEvent) {
        for producer in &self.lifecycle_changed_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_refresh_failed(&self, event: RefreshFailedEvent) {
        for producer in &self.refresh_failed_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_lifecycle_changed: Option<EventHandler<LifecycleChangedEvent>>,
    pub on_refresh_failed: Option<EventHandler<RefreshFailedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: SyncHooks) -> Self {
        let on_lifecycle_changed = hooks.on_lifecycle_changed.map(|f| EventHandler::new(buffer_size, f));
        let on_refresh_failed = hooks.on_refresh_failed.map(|f| EventHandler::new(buffer_size, f));
        Self { on_lifecycle_changed, on_refresh_failed }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_lifecycle_changed {
            result.lifecycle_changed_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_refresh_failed {
            result.refresh_failed_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_lifecycle_changed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_refresh_failed {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        debug!("🪝️ Host hooks started");
    }
}

/// Callbacks the host can register to hear about things the engine does on its own initiative.
#[derive(Default, Clone)]
pub struct SyncHooks {
    pub on_lifecycle_changed: Option<Handler<LifecycleChangedEvent>>,
    pub on_refresh_failed: Option<Handler<RefreshFailedEvent>>,
}

impl SyncHooks {
    pub fn on_lifecycle_changed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(LifecycleChangedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_lifecycle_changed = Some(Arc::new(f));
        self
    }

    /// Called once for each failed shop status refresh. Hosts typically show a transient warning.
    pub fn on_refresh_failed<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(RefreshFailedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_refresh_failed = Some(Arc::new(f));
        self
    }
}
