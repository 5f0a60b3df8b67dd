use thiserror::Error;

use crate::events::ChannelId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushChannelError {
    #[error("Cannot open the {0} channel without a credential. It will be connected once one is available.")]
    MissingCredential(ChannelId),
    #[error("Unknown push channel: {0}")]
    UnknownChannel(String),
}

/// Reasons a push frame could not be turned into something the engine acts on. None of these are fatal; the frame is
/// logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    #[error("Malformed push payload. {0}")]
    Malformed(String),
    #[error("Push payload has no type discriminator")]
    MissingType,
    #[error("{0} event does not carry an order id")]
    MissingOrderId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Could not reach the server. {0}")]
    Network(String),
    #[error("The server responded with something unexpected. {0}")]
    InvalidResponse(String),
    #[error("The request was not authorised")]
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}. {reason}")]
    InvalidValue { name: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    PushChannel(#[from] PushChannelError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
