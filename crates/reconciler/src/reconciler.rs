use std::collections::HashMap;
use std::sync::Arc;

use ledger::SharedLedger;
use model::{BackfillRequest, Period};
use parking_lot::Mutex;
use publisher::SharedPublisher;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::ReconcilerConfig;

/// Keeps every configured canonical series topped up to the target length.
pub struct Reconciler {
    config: ReconcilerConfig,
    ledger: SharedLedger,
    publisher: SharedPublisher,
    /// Instrument -> time (ms) of the last backfill request.
    last_request: Mutex<HashMap<String, i64>>,
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig, ledger: SharedLedger, publisher: SharedPublisher) -> Self {
        Self {
            config,
            ledger,
            publisher,
            last_request: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Periods of `instrument` whose series is still below target, with their length.
    pub fn short_periods(&self, instrument: &str) -> Vec<(Period, usize)> {
        self.config
            .periods
            .iter()
            .map(|p| (*p, self.ledger.historical_len(instrument, *p)))
            .filter(|(_, len)| *len < self.config.target_bars)
            .collect()
    }

    pub fn last_request_at(&self, instrument: &str) -> Option<i64> {
        self.last_request.lock().get(instrument).copied()
    }

    /// One reconciliation pass. Returns the instruments a backfill was issued for.
    pub async fn run_once(&self, now_ms: i64) -> Vec<String> {
        let mut requested = Vec::new();

        for instrument in &self.config.instruments {
            let short = self.short_periods(instrument);
            if short.is_empty() {
                continue;
            }
            if !self.claim(instrument, now_ms) {
                debug!(instrument = %instrument, "backfill cooling down");
                continue;
            }

            info!(
                instrument = %instrument,
                short = ?short,
                target = self.config.target_bars,
                "series incomplete, requesting backfill"
            );
            self.publish(instrument).await;
            requested.push(instrument.clone());
        }

        requested
    }

    /// Request a backfill for every instrument regardless of series state.
    pub async fn request_initial(&self, now_ms: i64) {
        info!(
            instruments = self.config.instruments.len(),
            bars = self.config.target_bars,
            "requesting initial historical data"
        );
        for instrument in &self.config.instruments {
            self.last_request.lock().insert(instrument.clone(), now_ms);
            self.publish(instrument).await;
        }
    }

    /// Request a backfill for one instrument immediately, bypassing the cooldown.
    pub async fn request_now(&self, instrument: &str, now_ms: i64) {
        self.last_request
            .lock()
            .insert(instrument.to_string(), now_ms);
        self.publish(instrument).await;
    }

    /// Periodic loop until shutdown is signalled.
    pub async fn run(self: Arc<Self>, mut shutdown_rx: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        info!(interval_secs = period.as_secs_f64(), "reconciler started");

        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.run_once(common::timestamp_ms()).await;
                }
            }
        }

        info!("reconciler stopped");
    }

    /// Record a request for `instrument` unless one was made within the cooldown.
    fn claim(&self, instrument: &str, now_ms: i64) -> bool {
        let mut last = self.last_request.lock();
        match last.get(instrument) {
            Some(at) if now_ms - at < self.config.cooldown_ms() => false,
            _ => {
                last.insert(instrument.to_string(), now_ms);
                true
            }
        }
    }

    async fn publish(&self, instrument: &str) {
        let request = BackfillRequest::new(instrument, self.config.target_bars);
        if let Err(e) = self.publisher.request_historical_bars(request).await {
            warn!(instrument = %instrument, error = %e, "backfill request failed");
        }
    }
}
