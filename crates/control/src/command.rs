//! Control-surface command shapes.
//!
//! One JSON object per command, discriminated by `type`:
//!
//! ```json
//! {"type":"STRATEGY_START","instrument":"EURUSD","strategyKey":"DEMA_RSI","qty":0.1,"atrMult":2}
//! ```

use std::fmt;

use model::{OrderCmd, Period};
use rust_decimal::Decimal;
use serde::Deserialize;
use strategy_core::Params;

use crate::ControlError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn market_cmd(&self) -> OrderCmd {
        match self {
            Side::Buy => OrderCmd::Buy,
            Side::Sell => OrderCmd::Sell,
        }
    }

    pub fn limit_cmd(&self) -> OrderCmd {
        match self {
            Side::Buy => OrderCmd::BuyLimit,
            Side::Sell => OrderCmd::SellLimit,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlCommand {
    #[serde(rename_all = "camelCase")]
    StrategyStart {
        #[serde(default)]
        instrument: String,
        #[serde(default)]
        strategy_key: String,
        #[serde(default)]
        period: Option<String>,
        #[serde(default)]
        qty: Decimal,
        #[serde(default)]
        atr_mult: Decimal,
        #[serde(default)]
        params: Params,
        #[serde(default)]
        sl_pips: Option<Decimal>,
    },
    #[serde(rename_all = "camelCase")]
    StrategyStop {
        #[serde(default)]
        instrument: String,
        #[serde(default)]
        period: Option<String>,
    },
    StrategyStatus,
    LedgerHealth,
    #[serde(rename_all = "camelCase")]
    HistoricalDataRequest {
        #[serde(default)]
        instrument: String,
    },
    #[serde(rename_all = "camelCase")]
    PlaceOrder {
        #[serde(default)]
        instrument: String,
        side: Side,
        #[serde(default)]
        qty: Decimal,
        #[serde(default)]
        sl_pips: Option<Decimal>,
        #[serde(default)]
        tp_pips: Option<Decimal>,
        #[serde(default)]
        slippage: Option<Decimal>,
    },
    #[serde(rename_all = "camelCase")]
    PlaceLimit {
        #[serde(default)]
        instrument: String,
        side: Side,
        #[serde(default)]
        qty: Decimal,
        #[serde(default)]
        price: Decimal,
        #[serde(default)]
        sl_pips: Option<Decimal>,
        #[serde(default)]
        tp_pips: Option<Decimal>,
    },
    #[serde(rename_all = "camelCase")]
    CloseAll {
        #[serde(default)]
        instrument: String,
        side: Side,
    },
    #[serde(rename_all = "camelCase")]
    CloseOrder {
        #[serde(default)]
        order_id: String,
        #[serde(default)]
        instrument: String,
        #[serde(default)]
        side: Option<Side>,
    },
}

impl ControlCommand {
    pub fn parse(raw: &str) -> Result<Self, ControlError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ControlError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlCommand::StrategyStart { .. } => "STRATEGY_START",
            ControlCommand::StrategyStop { .. } => "STRATEGY_STOP",
            ControlCommand::StrategyStatus => "STRATEGY_STATUS",
            ControlCommand::LedgerHealth => "LEDGER_HEALTH",
            ControlCommand::HistoricalDataRequest { .. } => "HISTORICAL_DATA_REQUEST",
            ControlCommand::PlaceOrder { .. } => "PLACE_ORDER",
            ControlCommand::PlaceLimit { .. } => "PLACE_LIMIT",
            ControlCommand::CloseAll { .. } => "CLOSE_ALL",
            ControlCommand::CloseOrder { .. } => "CLOSE_ORDER",
        }
    }
}

/// Period of a strategy command; absent or empty means `ONE_MIN`.
pub(crate) fn parse_period(period: Option<&str>) -> Result<Period, ControlError> {
    match period.map(str::trim) {
        None | Some("") => Ok(Period::OneMin),
        Some(p) => p.parse().map_err(|e| ControlError::invalid(format!("{e}"))),
    }
}

/// Trimmed, upper-cased instrument; empty is an error.
pub(crate) fn require_instrument(instrument: &str) -> Result<String, ControlError> {
    let instrument = instrument.trim().to_ascii_uppercase();
    if instrument.is_empty() {
        return Err(ControlError::invalid("missing instrument"));
    }
    Ok(instrument)
}
