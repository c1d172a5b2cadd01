use publisher::PublishError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    /// Not JSON, unknown `type`, or a field of the wrong shape.
    #[error("unparseable control command: {0}")]
    Parse(#[from] serde_json::Error),

    /// Well-formed but missing or out-of-range values.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Market order on an instrument without ticks.
    #[error("no tick to price a market order on {0}")]
    NoPriceReference(String),

    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
}

impl ControlError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ControlError::InvalidCommand(reason.into())
    }
}
