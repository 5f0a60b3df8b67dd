use std::{
    fmt::Display,
    sync::{Arc, RwLock},
};

use log::*;

use crate::{
    events::{Handler, InboundFrame},
    helpers::{read, write},
};

/// Subscribes a listener to every event name.
pub const ALL_EVENTS: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

struct Listener {
    id: ListenerId,
    event: String,
    handler: Handler<InboundFrame>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<Listener>,
}

/// The listeners registered with the push channel manager, in registration order.
///
/// Cloning the registry gives another handle to the same set of listeners.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<RwLock<Listeners>>,
}

impl ListenerRegistry {
    pub fn add(&self, event: &str, handler: Handler<InboundFrame>) -> ListenerId {
        let mut listeners = write(&self.inner);
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push(Listener { id, event: event.to_string(), handler });
        debug!("📡️ Registered {id} for '{event}'");
        id
    }

    /// Returns true if the listener was registered under `event`.
    pub fn remove(&self, event: &str, id: ListenerId) -> bool {
        let mut listeners = write(&self.inner);
        let before = listeners.entries.len();
        listeners.entries.retain(|l| !(l.id == id && l.event == event));
        let removed = listeners.entries.len() < before;
        if removed {
            debug!("📡️ Removed {id} from '{event}'");
        }
        removed
    }

    pub fn len(&self) -> usize {
        read(&self.inner).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, event: &str) -> Vec<(ListenerId, Handler<InboundFrame>)> {
        read(&self.inner)
            .entries
            .iter()
            .filter(|l| l.event == ALL_EVENTS || l.event == event)
            .map(|l| (l.id, Arc::clone(&l.handler)))
            .collect()
    }

    /// Hands the frame to every matching listener, one after the other.
    ///
    /// A listener removed while the frame is being dispatched does not see the frame unless it has already started.
    pub async fn dispatch(&self, frame: InboundFrame) {
        let candidates = self.matching(&frame.event);
        if candidates.is_empty() {
            trace!("📡️ No listeners for '{}' on {}", frame.event, frame.channel);
            return;
        }
        for (id, handler) in candidates {
            if !self.contains(id) {
                continue;
            }
            (handler)(frame.clone()).await;
        }
    }

    fn contains(&self, id: ListenerId) -> bool {
        read(&self.inner).entries.iter().any(|l| l.id == id)
    }
}
