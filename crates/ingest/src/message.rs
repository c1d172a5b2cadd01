use ledger::LedgerStore;
use model::{AccountInfo, Bar, HistoricalBar, MessageClass, Tick};
use serde::de::DeserializeOwned;

use crate::error::IngestError;

/// A decoded inbound message.
#[derive(Debug, Clone)]
pub enum Message {
    Tick(Tick),
    LiveBar(Bar),
    HistoricalBar(HistoricalBar),
    Account(AccountInfo),
}

fn parse<T: DeserializeOwned>(class: MessageClass, body: &[u8]) -> Result<T, IngestError> {
    serde_json::from_slice(body).map_err(|e| IngestError::Malformed {
        class,
        reason: e.to_string(),
    })
}

impl Message {
    pub fn decode(class: MessageClass, body: &[u8]) -> Result<Self, IngestError> {
        Ok(match class {
            MessageClass::Tick => Message::Tick(parse(class, body)?),
            MessageClass::LiveBar => Message::LiveBar(parse(class, body)?),
            MessageClass::HistoricalBar => Message::HistoricalBar(parse(class, body)?),
            MessageClass::Account => Message::Account(parse(class, body)?),
        })
    }

    pub fn class(&self) -> MessageClass {
        match self {
            Message::Tick(_) => MessageClass::Tick,
            Message::LiveBar(_) => MessageClass::LiveBar,
            Message::HistoricalBar(_) => MessageClass::HistoricalBar,
            Message::Account(_) => MessageClass::Account,
        }
    }

    /// Producer timestamp (ms).
    pub fn produced_at(&self) -> i64 {
        match self {
            Message::Tick(t) => t.produced_at,
            Message::LiveBar(b) => b.produced_at,
            Message::HistoricalBar(b) => b.produced_at,
            Message::Account(a) => a.produced_at,
        }
    }

    /// Older than `threshold_ms` at `now_ms`. Bulk historical bars are never
    /// stale: they merge by close time, so a late backfill is still useful.
    pub fn is_stale(&self, now_ms: i64, threshold_ms: i64) -> bool {
        if matches!(self, Message::HistoricalBar(_)) {
            return false;
        }
        now_ms.saturating_sub(self.produced_at()) > threshold_ms
    }

    /// Apply the matching ledger mutation.
    pub fn apply(self, ledger: &LedgerStore) {
        match self {
            Message::Tick(t) => ledger.update_tick(t),
            Message::LiveBar(b) => ledger.update_live_bar(b),
            Message::HistoricalBar(b) => ledger.update_historical_bar(b),
            Message::Account(a) => ledger.update_account_info(a),
        }
    }
}
