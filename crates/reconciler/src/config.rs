use std::time::Duration;

use ledger::BAR_HISTORY;
use model::{Period, DEFAULT_INSTRUMENTS};

/// Settings for the backfill loop and the monitoring tasks.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    pub instruments: Vec<String>,
    pub periods: Vec<Period>,
    /// Bars requested per backfill, and the length a series must reach.
    pub target_bars: usize,
    pub interval: Duration,
    /// Minimum time between two backfills for the same instrument.
    pub cooldown: Duration,
    pub stats_interval: Duration,
    pub freshness_interval: Duration,
    /// Newest tick older than this is reported as stale.
    pub max_tick_age: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            periods: Period::ALL.to_vec(),
            target_bars: BAR_HISTORY,
            interval: Duration::from_secs(15),
            cooldown: Duration::from_secs(30),
            stats_interval: Duration::from_secs(10),
            freshness_interval: Duration::from_secs(30),
            max_tick_age: Duration::from_secs(5 * 60),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_instruments(mut self, instruments: Vec<String>) -> Self {
        self.instruments = instruments;
        self
    }

    pub fn with_periods(mut self, periods: Vec<Period>) -> Self {
        self.periods = periods;
        self
    }

    pub fn with_target_bars(mut self, target_bars: usize) -> Self {
        self.target_bars = target_bars.max(1);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_stats_interval(mut self, interval: Duration) -> Self {
        self.stats_interval = interval;
        self
    }

    pub fn with_freshness_interval(mut self, interval: Duration) -> Self {
        self.freshness_interval = interval;
        self
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown.as_millis() as i64
    }

    pub fn max_tick_age_ms(&self) -> i64 {
        self.max_tick_age.as_millis() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.instruments.len(), 10);
        assert_eq!(config.periods.len(), Period::ALL.len());
        assert_eq!(config.target_bars, 200);
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.cooldown_ms(), 30_000);
        assert_eq!(config.max_tick_age_ms(), 300_000);
    }

    #[test]
    fn test_builders() {
        let config = ReconcilerConfig::default()
            .with_instruments(vec!["EURUSD".into()])
            .with_periods(vec![Period::OneMin])
            .with_target_bars(0)
            .with_cooldown(Duration::from_secs(5));
        assert_eq!(config.instruments, vec!["EURUSD".to_string()]);
        assert_eq!(config.periods, vec![Period::OneMin]);
        assert_eq!(config.target_bars, 1);
        assert_eq!(config.cooldown_ms(), 5_000);
    }
}
