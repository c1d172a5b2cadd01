use std::collections::HashMap;
use std::fmt;

use model::{OrderCmd, Period};
use rust_decimal::Decimal;
use serde::Serialize;

/// Lifecycle status of a strategy run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    /// Stopped by a stop command.
    Stopped,
    /// Stopped because the process is shutting down.
    Shutdown,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Stopped => write!(f, "stopped"),
            RunStatus::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryIntent {
    Long,
    Short,
}

impl From<OrderCmd> for EntryIntent {
    fn from(cmd: OrderCmd) -> Self {
        if cmd.is_buy() {
            EntryIntent::Long
        } else {
            EntryIntent::Short
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSource {
    Strategy,
    Manual,
}

/// Everything known about a submitted order at submission time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub ts: i64,
    pub label: String,
    pub instrument: String,
    pub order_cmd: OrderCmd,
    pub entry_intent: EntryIntent,
    pub amount: Decimal,
    /// Limit price, or the reference price of a market order.
    pub price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub pip_size: Decimal,
    pub planned_sl_pips: Option<Decimal>,
    pub planned_tp_pips: Option<Decimal>,
    pub source: OrderSource,
    pub run_id: Option<String>,
    pub strategy_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "eventType", rename_all = "snake_case")]
pub enum AuditEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted {
        ts: i64,
        run_id: String,
        instrument: String,
        period: Period,
        strategy_key: String,
        qty: Decimal,
        atr_mult: Decimal,
        params: HashMap<String, f64>,
    },
    #[serde(rename_all = "camelCase")]
    RunStopped {
        ts: i64,
        run_id: String,
        status: RunStatus,
    },
    #[serde(rename_all = "camelCase")]
    SignalEmitted {
        ts: i64,
        run_id: String,
        instrument: String,
        period: Period,
        strategy_key: String,
        signal: String,
        bar_end_timestamp: i64,
        sequence: i64,
    },
    OrderSubmitted(OrderRecord),
    #[serde(rename_all = "camelCase")]
    CloseRequested {
        ts: i64,
        order_id: String,
        instrument: String,
        side: String,
    },
}

impl AuditEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::RunStarted { .. } => "run_started",
            AuditEvent::RunStopped { .. } => "run_stopped",
            AuditEvent::SignalEmitted { .. } => "signal_emitted",
            AuditEvent::OrderSubmitted(_) => "order_submitted",
            AuditEvent::CloseRequested { .. } => "close_requested",
        }
    }

    /// Run the event belongs to, if any.
    pub fn run_id(&self) -> Option<&str> {
        match self {
            AuditEvent::RunStarted { run_id, .. }
            | AuditEvent::RunStopped { run_id, .. }
            | AuditEvent::SignalEmitted { run_id, .. } => Some(run_id),
            AuditEvent::OrderSubmitted(order) => order.run_id.as_deref(),
            AuditEvent::CloseRequested { .. } => None,
        }
    }
}
