//! Ledger statistics and health summary.

use std::collections::HashSet;

use serde::Serialize;

use model::Period;

use crate::store::LedgerStore;

/// A tick counts as live when it is at most this old.
pub const LIVE_TICK_WINDOW_MS: i64 = 5_000;
/// Bars a period needs before it is considered complete.
pub const MIN_VALID_BARS: usize = 200;
/// Newest entries inspected for ordering and duplicates.
const VALIDITY_WINDOW: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub period: Period,
    pub live_bars: usize,
    pub historical_bars: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentStats {
    pub instrument: String,
    pub ticks: usize,
    pub periods: Vec<PeriodStats>,
}

/// Per-instrument entry counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerStats {
    pub instruments: Vec<InstrumentStats>,
}

impl LedgerStats {
    pub fn total_ticks(&self) -> usize {
        self.instruments.iter().map(|i| i.ticks).sum()
    }

    pub fn total_live_bars(&self) -> usize {
        self.instruments
            .iter()
            .flat_map(|i| &i.periods)
            .map(|p| p.live_bars)
            .sum()
    }

    pub fn total_historical_bars(&self) -> usize {
        self.instruments
            .iter()
            .flat_map(|i| &i.periods)
            .map(|p| p.historical_bars)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicksHealth {
    pub count: usize,
    pub live: bool,
    pub last_ts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodHealth {
    pub period: Period,
    pub count: usize,
    /// At least [`MIN_VALID_BARS`] entries and the newest ones are ordered
    /// with no repeated close time.
    pub valid: bool,
    pub newest_ts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentHealth {
    pub instrument: String,
    pub ticks: TicksHealth,
    pub periods: Vec<PeriodHealth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub generated_at: i64,
    pub instruments: Vec<InstrumentHealth>,
}

impl HealthSummary {
    /// Instruments with at least one period short of a full series.
    pub fn incomplete(&self) -> impl Iterator<Item = &InstrumentHealth> {
        self.instruments
            .iter()
            .filter(|i| i.periods.iter().any(|p| !p.valid))
    }
}

impl LedgerStore {
    pub fn stats(&self, instruments: &[String]) -> LedgerStats {
        let instruments = instruments
            .iter()
            .map(|instrument| {
                let (ticks, per_period) = self.counts(instrument);
                InstrumentStats {
                    instrument: instrument.clone(),
                    ticks,
                    periods: per_period
                        .into_iter()
                        .map(|(period, live_bars, historical_bars)| PeriodStats {
                            period,
                            live_bars,
                            historical_bars,
                        })
                        .collect(),
                }
            })
            .collect();
        LedgerStats { instruments }
    }

    pub fn health_summary(&self, instruments: &[String], now_ms: i64) -> HealthSummary {
        let instruments = instruments
            .iter()
            .map(|instrument| InstrumentHealth {
                instrument: instrument.clone(),
                ticks: self.ticks_health(instrument, now_ms),
                periods: Period::ALL
                    .iter()
                    .map(|p| self.period_health(instrument, *p))
                    .collect(),
            })
            .collect();

        HealthSummary {
            generated_at: now_ms,
            instruments,
        }
    }

    fn ticks_health(&self, instrument: &str, now_ms: i64) -> TicksHealth {
        let count = self.ticks(instrument).len();
        let last_ts = self
            .latest_tick(instrument)
            .map(|t| t.latest_ts())
            .filter(|ts| *ts > 0);
        TicksHealth {
            count,
            live: last_ts.is_some_and(|ts| now_ms - ts <= LIVE_TICK_WINDOW_MS),
            last_ts,
        }
    }

    fn period_health(&self, instrument: &str, period: Period) -> PeriodHealth {
        let series = self.historical_bars(instrument, period);
        let newest_ts = series.first().map(|b| b.bar_end_timestamp);

        let valid = series.len() >= MIN_VALID_BARS && {
            let mut seen = HashSet::new();
            let window = &series[..series.len().min(VALIDITY_WINDOW)];
            window.iter().all(|b| seen.insert(b.bar_end_timestamp))
                && window
                    .windows(2)
                    .all(|w| w[0].bar_end_timestamp >= w[1].bar_end_timestamp)
        };

        PeriodHealth {
            period,
            count: series.len(),
            valid,
            newest_ts,
        }
    }
}
