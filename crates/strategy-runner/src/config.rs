//! Scheduler configuration.

use std::time::Duration;

use rust_decimal::Decimal;

/// Settings shared by every strategy run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How often a run checks its series for a new bar.
    pub poll_interval: Duration,
    /// Slippage in pips sent with every strategy order.
    pub slippage_pips: Decimal,
    /// Stop distance used when no positive ATR is available.
    pub default_sl_pips: Decimal,
    /// Floor for ATR-derived stop distances.
    pub min_sl_pips: Decimal,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            slippage_pips: Decimal::from(5),
            default_sl_pips: Decimal::from(10),
            min_sl_pips: Decimal::ONE,
        }
    }
}

impl SchedulerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_slippage_pips(mut self, pips: Decimal) -> Self {
        self.slippage_pips = pips;
        self
    }

    pub fn with_default_sl_pips(mut self, pips: Decimal) -> Self {
        self.default_sl_pips = pips;
        self
    }
}
