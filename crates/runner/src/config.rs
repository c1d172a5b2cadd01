//! Process configuration from the environment.

use std::path::PathBuf;

use common::{env_list, env_or};
use ingest::IngestConfig;
use ledger::BAR_HISTORY;
use model::DEFAULT_INSTRUMENTS;
use reconciler::ReconcilerConfig;
use strategy_runner::SchedulerConfig;

/// Top-level settings for the `fx-trader` binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub instruments: Vec<String>,
    /// Bars requested per backfill.
    pub historical_bars: usize,
    /// Log outbound messages instead of handing them to the transport.
    pub dry_run: bool,
    /// JSON-lines replay file; stdin when unset.
    pub feed: Option<PathBuf>,
    pub outbound_capacity: usize,
    pub ingest: IngestConfig,
    pub scheduler: SchedulerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            instruments: DEFAULT_INSTRUMENTS.iter().map(|s| s.to_string()).collect(),
            historical_bars: BAR_HISTORY,
            dry_run: true,
            feed: None,
            outbound_capacity: 256,
            ingest: IngestConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read `TRADER_INSTRUMENTS`, `TRADER_HISTORICAL_BARS`, `TRADER_DRY_RUN`
    /// and `TRADER_FEED`. Invalid values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            instruments: env_list("TRADER_INSTRUMENTS").unwrap_or(defaults.instruments),
            historical_bars: env_or("TRADER_HISTORICAL_BARS", defaults.historical_bars).max(1),
            dry_run: env_or("TRADER_DRY_RUN", defaults.dry_run),
            feed: std::env::var("TRADER_FEED")
                .ok()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            ..defaults
        }
    }

    pub fn reconciler(&self) -> ReconcilerConfig {
        ReconcilerConfig::default()
            .with_instruments(self.instruments.clone())
            .with_target_bars(self.historical_bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.instruments.len(), 10);
        assert_eq!(config.historical_bars, 200);
        assert!(config.dry_run);
        assert!(config.feed.is_none());
    }

    #[test]
    fn test_reconciler_follows_app_settings() {
        let config = AppConfig {
            instruments: vec!["EURUSD".into()],
            historical_bars: 150,
            ..AppConfig::default()
        };
        let reconciler = config.reconciler();
        assert_eq!(reconciler.instruments, vec!["EURUSD".to_string()]);
        assert_eq!(reconciler.target_bars, 150);
    }
}
