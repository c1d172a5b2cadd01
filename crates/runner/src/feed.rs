//! JSON-lines feed replay.
//!
//! Each line is either a broker delivery or a control command:
//!
//! ```text
//! {"queue":"Market_Data_Ticks","body":{"produced_at":...,"instrument":"EURUSD",...}}
//! {"control":{"type":"STRATEGY_START","instrument":"EURUSD","strategyKey":"DEMA_RSI"}}
//! ```

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FeedLine {
    Delivery { queue: String, body: Value },
    Control { control: Value },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("cannot open feed: {0}")]
    Open(#[from] std::io::Error),

    #[error("unrecognised feed line: {0}")]
    Line(#[from] serde_json::Error),
}

impl FeedLine {
    /// Parse one line; blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, FeedError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(line)?))
    }
}

/// Raw body bytes as the broker would deliver them. String bodies are sent
/// verbatim, anything else as compact JSON.
pub fn body_bytes(body: Value) -> Vec<u8> {
    match body {
        Value::String(s) => s.into_bytes(),
        other => other.to_string().into_bytes(),
    }
}
