use std::time::Duration;

use ledger::SharedLedger;
use metrics::SharedMetrics;
use model::MessageClass;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

/// Why an instrument's tick stream looks dead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickFreshness {
    Missing,
    Stale { age_ms: i64 },
}

/// Instruments with no ticks, or whose newest tick is older than `max_age_ms`.
pub fn stale_instruments(
    ledger: &SharedLedger,
    instruments: &[String],
    now_ms: i64,
    max_age_ms: i64,
) -> Vec<(String, TickFreshness)> {
    instruments
        .iter()
        .filter_map(|instrument| match ledger.latest_tick(instrument) {
            None => Some((instrument.clone(), TickFreshness::Missing)),
            Some(tick) => {
                let age_ms = now_ms - tick.latest_ts();
                (age_ms > max_age_ms).then(|| (instrument.clone(), TickFreshness::Stale { age_ms }))
            }
        })
        .collect()
}

/// Log a line of ingestion and ledger statistics every `every`.
pub fn spawn_stats_reporter(
    ledger: SharedLedger,
    metrics: SharedMetrics,
    instruments: Vec<String>,
    every: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    spawn_periodic(every, shutdown_rx, move || {
        let snapshot = metrics.snapshot();
        let stats = ledger.stats(&instruments);
        info!(
            status = %snapshot.health_status(),
            uptime_secs = format!("{:.0}", snapshot.uptime_secs),
            ticks_applied = snapshot.class(MessageClass::Tick).applied,
            live_bars_applied = snapshot.class(MessageClass::LiveBar).applied,
            historical_applied = snapshot.class(MessageClass::HistoricalBar).applied,
            dropped = snapshot.total_dropped(),
            malformed = snapshot.total_malformed(),
            ledger_ticks = stats.total_ticks(),
            ledger_live_bars = stats.total_live_bars(),
            ledger_historical_bars = stats.total_historical_bars(),
            "Ingestion stats"
        );
    })
}

/// Warn about instruments with a dead tick stream every `every`.
pub fn spawn_freshness_checker(
    ledger: SharedLedger,
    instruments: Vec<String>,
    every: Duration,
    max_age: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let max_age_ms = max_age.as_millis() as i64;
    spawn_periodic(every, shutdown_rx, move || {
        let now = common::timestamp_ms();
        for (instrument, freshness) in stale_instruments(&ledger, &instruments, now, max_age_ms) {
            match freshness {
                TickFreshness::Missing => warn!(instrument = %instrument, "no ticks received"),
                TickFreshness::Stale { age_ms } => {
                    warn!(instrument = %instrument, age_secs = age_ms / 1000, "ticks are stale")
                }
            }
        }
    })
}

fn spawn_periodic<F>(every: Duration, mut shutdown_rx: watch::Receiver<bool>, mut f: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + every, every);
        loop {
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => f(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger::create_ledger;
    use model::Tick;
    use rust_decimal_macros::dec;

    fn tick(instrument: &str, ts: i64) -> Tick {
        Tick {
            produced_at: ts,
            timestamp: ts,
            pair_id: 1,
            instrument: instrument.to_string(),
            bid: dec!(1.1),
            ask: dec!(1.1002),
            bid_vol: dec!(1),
            ask_vol: dec!(1),
        }
    }

    #[test]
    fn test_stale_instruments() {
        let ledger = create_ledger();
        ledger.update_tick(tick("EURUSD", 1_000_000));
        ledger.update_tick(tick("GBPUSD", 100_000));
        let instruments: Vec<String> = ["EURUSD", "GBPUSD", "USDJPY"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let stale = stale_instruments(&ledger, &instruments, 1_010_000, 300_000);
        assert_eq!(
            stale,
            vec![
                ("GBPUSD".to_string(), TickFreshness::Stale { age_ms: 910_000 }),
                ("USDJPY".to_string(), TickFreshness::Missing),
            ]
        );
    }

    #[tokio::test]
    async fn test_periodic_tasks_exit_on_shutdown() {
        let ledger = create_ledger();
        let metrics = metrics::create_metrics();
        let (tx, rx) = watch::channel(false);
        let instruments = vec!["EURUSD".to_string()];

        let stats = spawn_stats_reporter(
            ledger.clone(),
            metrics,
            instruments.clone(),
            Duration::from_millis(10),
            rx.clone(),
        );
        let fresh = spawn_freshness_checker(
            ledger,
            instruments,
            Duration::from_millis(10),
            Duration::from_secs(300),
            rx,
        );

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        for h in [stats, fresh] {
            tokio::time::timeout(Duration::from_secs(5), h)
                .await
                .unwrap()
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_periodic_task_exits_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        let fresh = spawn_freshness_checker(
            create_ledger(),
            vec!["EURUSD".to_string()],
            Duration::from_secs(60),
            Duration::from_secs(300),
            rx,
        );

        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), fresh)
            .await
            .unwrap()
            .unwrap();
    }
}
