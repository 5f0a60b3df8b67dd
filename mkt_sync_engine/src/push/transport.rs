use mkt_common::Secret;

use crate::events::{ChannelId, EventProducer, InboundFrame};

/// A live connection for one channel, opened with one credential.
pub trait TransportSession: Send {
    /// Closes the session. No frames may be published to the sink afterwards. Closing twice is a no-op.
    fn close(&mut self);
    fn is_open(&self) -> bool;
}

/// Opens push sessions.
///
/// Opening never fails from the caller's point of view: connection errors, retries and backoff are the transport's
/// business, and are logged by it. Frames must be published to `sink` in the order the transport receives them.
pub trait PushTransport: Send + Sync {
    fn open(
        &self,
        channel: ChannelId,
        credential: &Secret<String>,
        sink: EventProducer<InboundFrame>,
    ) -> Box<dyn TransportSession>;
}
