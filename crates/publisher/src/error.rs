//! Publisher error types.

use thiserror::Error;

/// Errors that can occur while publishing an outbound message.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Failed to serialize the message body.
    #[error("encode error: {0}")]
    Encode(String),

    /// The outbound channel has no receiver.
    #[error("outbound channel closed")]
    ChannelClosed,

    /// The transport refused or failed the publish.
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<serde_json::Error> for PublishError {
    fn from(err: serde_json::Error) -> Self {
        PublishError::Encode(err.to_string())
    }
}
