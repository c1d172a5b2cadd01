//! Queue sizing and worker pool configuration.

use std::time::Duration;

use model::MessageClass;

/// Configuration for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    // === Queue capacities ===
    /// Ticks arrive at high frequency.
    pub tick_capacity: usize,
    pub live_bar_capacity: usize,
    /// Historical responses arrive in bursts of a few hundred bars.
    pub historical_capacity: usize,
    pub account_capacity: usize,

    // === Worker pools ===
    pub tick_workers: usize,
    pub live_bar_workers: usize,
    pub historical_workers: usize,
    pub account_workers: usize,

    /// Messages produced longer ago than this are acknowledged and discarded.
    pub stale_threshold: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            tick_capacity: 1000,
            live_bar_capacity: 100,
            historical_capacity: 500,
            account_capacity: 10,

            tick_workers: 1,
            live_bar_workers: 3,
            historical_workers: 2,
            account_workers: 1,

            stale_threshold: Duration::from_secs(3),
        }
    }
}

impl IngestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue capacity for a message class (at least one).
    pub fn capacity(&self, class: MessageClass) -> usize {
        let n = match class {
            MessageClass::Tick => self.tick_capacity,
            MessageClass::LiveBar => self.live_bar_capacity,
            MessageClass::HistoricalBar => self.historical_capacity,
            MessageClass::Account => self.account_capacity,
        };
        n.max(1)
    }

    /// Worker count for a message class (at least one).
    pub fn workers(&self, class: MessageClass) -> usize {
        let n = match class {
            MessageClass::Tick => self.tick_workers,
            MessageClass::LiveBar => self.live_bar_workers,
            MessageClass::HistoricalBar => self.historical_workers,
            MessageClass::Account => self.account_workers,
        };
        n.max(1)
    }

    /// Builder method to set the queue capacity of one class.
    pub fn with_capacity(mut self, class: MessageClass, capacity: usize) -> Self {
        match class {
            MessageClass::Tick => self.tick_capacity = capacity,
            MessageClass::LiveBar => self.live_bar_capacity = capacity,
            MessageClass::HistoricalBar => self.historical_capacity = capacity,
            MessageClass::Account => self.account_capacity = capacity,
        }
        self
    }

    /// Builder method to set the worker count of one class.
    pub fn with_workers(mut self, class: MessageClass, workers: usize) -> Self {
        match class {
            MessageClass::Tick => self.tick_workers = workers,
            MessageClass::LiveBar => self.live_bar_workers = workers,
            MessageClass::HistoricalBar => self.historical_workers = workers,
            MessageClass::Account => self.account_workers = workers,
        }
        self
    }

    /// Builder method to set the staleness threshold.
    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }
}
