//! Strategy error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyError {
    /// No built-in strategy is registered under the key.
    #[error("unknown strategy key: {0}")]
    UnknownKey(String),

    /// A recognised parameter was outside its valid range.
    #[error("parameter {key}={value} out of range")]
    InvalidParam { key: String, value: f64 },
}
