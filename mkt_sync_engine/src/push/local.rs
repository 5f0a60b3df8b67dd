use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
        Mutex,
    },
};

use chrono::Utc;
use log::*;
use mkt_common::Secret;
use serde_json::Value;

use crate::{
    events::{ChannelId, EventProducer, InboundFrame},
    helpers::lock,
    push::{PushTransport, TransportSession},
};

struct Endpoint {
    sink: EventProducer<InboundFrame>,
    open: Arc<AtomicBool>,
    credential: Secret<String>,
}

#[derive(Default)]
struct LocalState {
    endpoints: HashMap<ChannelId, Endpoint>,
    opened: HashMap<ChannelId, usize>,
}

/// An in-process push transport.
///
/// Nothing goes over the wire. Whoever holds a clone of the transport can [`deliver`](LocalTransport::deliver) frames
/// to whichever session is currently open for a channel. Useful for hosts that receive push events by some other
/// means, and for tests.
#[derive(Clone, Default)]
pub struct LocalTransport {
    state: Arc<Mutex<LocalState>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a frame to the open session for `channel`. Returns false, and drops the frame, if there is none.
    pub async fn deliver(&self, channel: ChannelId, event: &str, payload: Value) -> bool {
        let sink = {
            let state = lock(&self.state);
            state.endpoints.get(&channel).filter(|e| e.open.load(Ordering::SeqCst)).map(|e| e.sink.clone())
        };
        match sink {
            Some(sink) => {
                let frame = InboundFrame { channel, event: event.to_string(), payload, received_at: Utc::now() };
                sink.publish_event(frame).await;
                true
            },
            None => {
                debug!("📡️ No open {channel} session. Dropping '{event}' frame");
                false
            },
        }
    }

    pub fn is_open(&self, channel: ChannelId) -> bool {
        lock(&self.state).endpoints.get(&channel).is_some_and(|e| e.open.load(Ordering::SeqCst))
    }

    /// The number of live sessions across all channels.
    pub fn live_sessions(&self) -> usize {
        lock(&self.state).endpoints.values().filter(|e| e.open.load(Ordering::SeqCst)).count()
    }

    /// How many sessions have ever been opened for `channel`.
    pub fn sessions_opened(&self, channel: ChannelId) -> usize {
        lock(&self.state).opened.get(&channel).copied().unwrap_or_default()
    }

    /// The credential the open session for `channel` was opened with.
    pub fn credential(&self, channel: ChannelId) -> Option<Secret<String>> {
        lock(&self.state)
            .endpoints
            .get(&channel)
            .filter(|e| e.open.load(Ordering::SeqCst))
            .map(|e| e.credential.clone())
    }
}

impl PushTransport for LocalTransport {
    fn open(
        &self,
        channel: ChannelId,
        credential: &Secret<String>,
        sink: EventProducer<InboundFrame>,
    ) -> Box<dyn TransportSession> {
        let open = Arc::new(AtomicBool::new(true));
        let mut state = lock(&self.state);
        let endpoint = Endpoint { sink, open: Arc::clone(&open), credential: credential.clone() };
        if let Some(previous) = state.endpoints.insert(channel, endpoint) {
            if previous.open.load(Ordering::SeqCst) {
                warn!("📡️ A second {channel} session was opened while the first one is still open");
            }
        }
        *state.opened.entry(channel).or_default() += 1;
        trace!("📡️ Local {channel} session opened");
        Box::new(LocalSession { channel, open })
    }
}

pub struct LocalSession {
    channel: ChannelId,
    open: Arc<AtomicBool>,
}

impl TransportSession for LocalSession {
    fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            trace!("📡️ Local {} session closed", self.channel);
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for LocalSession {
    fn drop(&mut self) {
        self.close();
    }
}
