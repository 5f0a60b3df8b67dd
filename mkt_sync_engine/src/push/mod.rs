//! # Push channel manager
//!
//! The marketplace pushes events to the client over two independent channels, `notifications` and `admin-chat`. This
//! module owns the sessions for those channels and the listeners that consume their frames.
//!
//! * [`PushChannelManager`] opens and closes sessions as callers connect and as the credential changes.
//! * [`PushDispatcher`] feeds frames to listeners, sequentially and in arrival order.
//! * [`PushTransport`] is the seam to the actual wire protocol. [`LocalTransport`] is an in-process implementation.
mod listeners;
mod local;
mod manager;
mod transport;

pub use listeners::{ListenerId, ListenerRegistry, ALL_EVENTS};
pub use local::{LocalSession, LocalTransport};
pub use manager::{ChannelHandle, PushChannelManager, PushDispatcher};
pub use transport::{PushTransport, TransportSession};
