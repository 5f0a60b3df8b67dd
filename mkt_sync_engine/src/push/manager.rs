use std::{collections::HashMap, sync::Arc};

use log::*;
use mkt_common::Secret;

use crate::{
    errors::PushChannelError,
    events::{ChannelId, EventHandler, EventProducer, Handler, InboundFrame},
    push::{ListenerId, ListenerRegistry, PushTransport, TransportSession},
    traits::CredentialSource,
};

/// Identifies one live session. A new handle is issued every time a channel is (re)opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    pub channel: ChannelId,
    pub session: u64,
}

struct ChannelSession {
    handle: ChannelHandle,
    session: Box<dyn TransportSession>,
}

/// Drives the listeners registered with a [`PushChannelManager`].
///
/// Frames from every channel are queued here and handed to the listeners one at a time, in arrival order. Run it on
/// its own task. It stops once the manager and every transport session feeding it have been dropped.
pub struct PushDispatcher {
    handler: EventHandler<InboundFrame>,
}

impl PushDispatcher {
    pub async fn run(self) {
        self.handler.start_sequential().await;
    }
}

/// Owns the push sessions for the current user.
///
/// Channels are only ever open while a credential is present. Callers declare which channels they want with
/// [`connect`](PushChannelManager::connect); the manager opens, closes and reopens the underlying sessions as the
/// credential comes and goes, so that there is at most one live session per channel.
pub struct PushChannelManager {
    transport: Arc<dyn PushTransport>,
    credentials: Arc<dyn CredentialSource>,
    credential: Option<Secret<String>>,
    sessions: HashMap<ChannelId, ChannelSession>,
    wanted: HashMap<ChannelId, usize>,
    listeners: ListenerRegistry,
    sink: EventProducer<InboundFrame>,
    next_session: u64,
}

impl PushChannelManager {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        credentials: Arc<dyn CredentialSource>,
        buffer_size: usize,
    ) -> (Self, PushDispatcher) {
        let listeners = ListenerRegistry::default();
        let registry = listeners.clone();
        let handler = EventHandler::new(
            buffer_size,
            Arc::new(move |frame: InboundFrame| {
                let registry = registry.clone();
                Box::pin(async move { registry.dispatch(frame).await })
                    as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
            }),
        );
        let sink = handler.subscribe();
        let credential = usable(credentials.current_credential());
        let manager = Self {
            transport,
            credentials,
            credential,
            sessions: HashMap::new(),
            wanted: HashMap::new(),
            listeners,
            sink,
            next_session: 0,
        };
        (manager, PushDispatcher { handler })
    }

    /// Declares interest in `channel` and opens it if it is not open yet.
    ///
    /// Without a credential the channel is remembered and opened as soon as one arrives, and
    /// [`PushChannelError::MissingCredential`] is returned.
    pub fn connect(&mut self, channel: ChannelId) -> Result<ChannelHandle, PushChannelError> {
        *self.wanted.entry(channel).or_default() += 1;
        self.ensure_open(channel)
    }

    /// Releases one claim on `channel`. The session is closed when the last claim is released, or immediately if
    /// `force` is set. Returns true if a session was closed.
    pub fn disconnect(&mut self, channel: ChannelId, force: bool) -> bool {
        let remaining = match self.wanted.get_mut(&channel) {
            Some(count) if !force && *count > 1 => {
                *count -= 1;
                *count
            },
            _ => {
                self.wanted.remove(&channel);
                0
            },
        };
        if remaining > 0 {
            debug!("📡️ {channel} is still wanted by {remaining} callers");
            return false;
        }
        self.close(channel)
    }

    /// Registers a listener for frames named `event`, or for every frame with [`crate::push::ALL_EVENTS`].
    pub fn on(&self, event: &str, handler: Handler<InboundFrame>) -> ListenerId {
        self.listeners.add(event, handler)
    }

    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        self.listeners.remove(event, id)
    }

    /// Another handle to the listener registry, for callers that need to unregister after the manager has moved on.
    pub fn listeners(&self) -> ListenerRegistry {
        self.listeners.clone()
    }

    /// Applies a credential change announced by the host, e.g. a login or logout in another tab.
    pub fn credential_changed(&mut self, credential: Option<Secret<String>>) {
        let credential = usable(credential);
        if credential == self.credential {
            trace!("📡️ Credential unchanged");
            return;
        }
        match credential {
            None => {
                info!("📡️ Credential lost. Closing all push channels");
                self.credential = None;
                self.close_all();
            },
            Some(credential) => {
                let replacing = self.credential.is_some();
                self.credential = Some(credential);
                if replacing {
                    info!("📡️ Credential changed. Reopening push channels");
                    self.close_all();
                } else {
                    info!("📡️ Credential acquired. Opening wanted push channels");
                }
                self.open_wanted();
            },
        }
    }

    /// Reads the credential again, e.g. when the host window regains focus.
    pub fn recheck_credential(&mut self) {
        let current = self.credentials.current_credential();
        self.credential_changed(current);
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn is_connected(&self, channel: ChannelId) -> bool {
        self.sessions.get(&channel).is_some_and(|s| s.session.is_open())
    }

    pub fn handle(&self, channel: ChannelId) -> Option<ChannelHandle> {
        self.sessions.get(&channel).map(|s| s.handle)
    }

    pub fn is_wanted(&self, channel: ChannelId) -> bool {
        self.wanted.contains_key(&channel)
    }

    fn ensure_open(&mut self, channel: ChannelId) -> Result<ChannelHandle, PushChannelError> {
        if let Some(existing) = self.sessions.get(&channel) {
            if existing.session.is_open() {
                return Ok(existing.handle);
            }
            trace!("📡️ {channel} session was closed by the transport. Reopening");
        }
        let Some(credential) = &self.credential else {
            debug!("📡️ {channel} wanted, but there is no credential yet");
            return Err(PushChannelError::MissingCredential(channel));
        };
        self.next_session += 1;
        let handle = ChannelHandle { channel, session: self.next_session };
        let session = self.transport.open(channel, credential, self.sink.clone());
        if let Some(mut stale) = self.sessions.insert(channel, ChannelSession { handle, session }) {
            stale.session.close();
        }
        info!("📡️ Connected to {channel} (session {})", handle.session);
        Ok(handle)
    }

    fn open_wanted(&mut self) {
        let mut channels = self.wanted.keys().copied().collect::<Vec<_>>();
        channels.sort_by_key(|c| c.as_str());
        for channel in channels {
            if let Err(e) = self.ensure_open(channel) {
                warn!("📡️ Could not reopen {channel}. {e}");
            }
        }
    }

    fn close(&mut self, channel: ChannelId) -> bool {
        match self.sessions.remove(&channel) {
            Some(mut s) => {
                s.session.close();
                info!("📡️ Disconnected from {channel} (session {})", s.handle.session);
                true
            },
            None => false,
        }
    }

    fn close_all(&mut self) {
        let channels = self.sessions.keys().copied().collect::<Vec<_>>();
        for channel in channels {
            self.close(channel);
        }
    }
}

impl Drop for PushChannelManager {
    fn drop(&mut self) {
        self.close_all();
    }
}

fn usable(credential: Option<Secret<String>>) -> Option<Secret<String>> {
    credential.filter(|c| !c.is_blank())
}
