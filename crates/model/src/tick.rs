use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single top-of-book price change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tick {
    /// Producer wall-clock time (ms) when the message was emitted.
    pub produced_at: i64,
    /// Venue timestamp of the quote (ms).
    #[serde(default)]
    pub timestamp: i64,
    #[serde(rename = "pairId", default)]
    pub pair_id: i64,
    pub instrument: String,
    pub bid: Decimal,
    pub ask: Decimal,
    #[serde(rename = "bidVol", default)]
    pub bid_vol: Decimal,
    #[serde(rename = "askVol", default)]
    pub ask_vol: Decimal,
}

impl Tick {
    pub fn mid(&self) -> Decimal {
        (self.bid + self.ask) / Decimal::TWO
    }

    /// The newer of the venue and producer timestamps.
    pub fn latest_ts(&self) -> i64 {
        self.timestamp.max(self.produced_at)
    }
}
