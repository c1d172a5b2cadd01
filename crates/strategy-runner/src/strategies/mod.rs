//! Built-in strategies and the key registry.

mod breakout;
mod dema_rsi;
mod supertrend;

pub use breakout::DonchianBreakout;
pub use dema_rsi::DemaRsi;
pub use supertrend::Supertrend;

use rust_decimal::Decimal;
use strategy_core::{BoxedStrategy, StrategyError};
use tracing::warn;

/// Keys accepted by [`strategy_for_key`], aliases included.
pub const STRATEGY_KEYS: [&str; 5] = [
    DemaRsi::KEY,
    "DEMA+RSI",
    "DEMA",
    DonchianBreakout::KEY,
    Supertrend::KEY,
];

/// Build the strategy registered under `key`.
pub fn try_strategy_for_key(key: &str) -> Result<BoxedStrategy, StrategyError> {
    match key.trim().to_ascii_uppercase().as_str() {
        DemaRsi::KEY | "DEMA+RSI" | "DEMA" => Ok(Box::new(DemaRsi)),
        DonchianBreakout::KEY => Ok(Box::new(DonchianBreakout::default())),
        Supertrend::KEY => Ok(Box::new(Supertrend::default())),
        _ => Err(StrategyError::UnknownKey(key.to_string())),
    }
}

/// Like [`try_strategy_for_key`], falling back to DEMA_RSI for unknown keys.
pub fn strategy_for_key(key: &str) -> BoxedStrategy {
    try_strategy_for_key(key).unwrap_or_else(|e| {
        warn!(error = %e, fallback = DemaRsi::KEY, "using fallback strategy");
        Box::new(DemaRsi)
    })
}

fn to_decimal(v: f64) -> Decimal {
    Decimal::try_from(v).unwrap_or_default()
}
