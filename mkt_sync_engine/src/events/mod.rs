//! Events flowing through the sync engine.
//!
//! * [`InboundFrame`]s come in from the push transports and are classified into [`PushEvent`]s.
//! * [`LifecycleChangedEvent`] and [`RefreshFailedEvent`] go out to the host through [`SyncHooks`].
//!
//! Both directions use the same small pub-sub layer ([`EventHandler`] and [`EventProducer`]).
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventProducers, SyncHooks};
