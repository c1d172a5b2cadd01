//! In-memory ledger of recent market and account state.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use model::{AccountInfo, Bar, HistoricalBar, Period, Tick};

use crate::series;

/// Ticks kept per instrument.
pub const TICK_HISTORY: usize = 20;
/// Live bars, and canonical historical bars, kept per (instrument, period).
pub const BAR_HISTORY: usize = 200;

/// Everything held for one instrument.
#[derive(Debug, Default)]
struct InstrumentBook {
    ticks: VecDeque<Tick>,
    live_bars: HashMap<Period, VecDeque<Bar>>,
    historical: HashMap<Period, Vec<HistoricalBar>>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    books: HashMap<String, InstrumentBook>,
    account: AccountInfo,
}

/// Concurrency-safe store shared by ingestion, reconciliation and strategies.
///
/// A single lock guards all state and is held for one mutation or one read,
/// never across an `.await`. Every read returns an owned copy.
#[derive(Debug)]
pub struct LedgerStore {
    inner: RwLock<LedgerInner>,
    tick_capacity: usize,
    bar_capacity: usize,
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerStore {
    pub fn new() -> Self {
        Self::with_capacity(TICK_HISTORY, BAR_HISTORY)
    }

    /// Store with custom ring sizes. Zero sizes are raised to one.
    pub fn with_capacity(tick_capacity: usize, bar_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(LedgerInner::default()),
            tick_capacity: tick_capacity.max(1),
            bar_capacity: bar_capacity.max(1),
        }
    }

    pub fn bar_capacity(&self) -> usize {
        self.bar_capacity
    }

    // --- Mutations ---

    /// Append a tick to the instrument's ring, dropping the oldest beyond capacity.
    pub fn update_tick(&self, tick: Tick) {
        let mut inner = self.inner.write();
        let book = inner.books.entry(tick.instrument.clone()).or_default();
        book.ticks.push_back(tick);
        while book.ticks.len() > self.tick_capacity {
            book.ticks.pop_front();
        }
    }

    /// Record a closed live bar.
    ///
    /// The bar goes to the live ring as-is and is merged into the canonical
    /// series in historical shape.
    pub fn update_live_bar(&self, bar: Bar) {
        let converted = HistoricalBar::from(&bar);
        let mut inner = self.inner.write();
        let book = inner.books.entry(bar.instrument.clone()).or_default();

        let series = book.historical.entry(bar.period).or_default();
        series::merge_live(series, converted, self.bar_capacity);

        let ring = book.live_bars.entry(bar.period).or_default();
        ring.push_back(bar);
        while ring.len() > self.bar_capacity {
            ring.pop_front();
        }
    }

    /// Merge a bar from a bulk historical response into the canonical series.
    pub fn update_historical_bar(&self, bar: HistoricalBar) {
        let mut inner = self.inner.write();
        let series = inner
            .books
            .entry(bar.instrument.clone())
            .or_default()
            .historical
            .entry(bar.period)
            .or_default();
        series::merge_historical(series, bar, self.bar_capacity);
        trace!(len = series.len(), "historical bar merged");
    }

    /// Replace the account snapshot.
    pub fn update_account_info(&self, info: AccountInfo) {
        self.inner.write().account = info;
    }

    // --- Reads ---

    /// Recent ticks in arrival order, oldest first.
    pub fn ticks(&self, instrument: &str) -> Vec<Tick> {
        self.inner
            .read()
            .books
            .get(instrument)
            .map(|b| b.ticks.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn latest_tick(&self, instrument: &str) -> Option<Tick> {
        self.inner
            .read()
            .books
            .get(instrument)
            .and_then(|b| b.ticks.back().cloned())
    }

    /// Live bars in arrival order, oldest first.
    pub fn live_bars(&self, instrument: &str, period: Period) -> Vec<Bar> {
        self.inner
            .read()
            .books
            .get(instrument)
            .and_then(|b| b.live_bars.get(&period))
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Canonical series, newest first.
    pub fn historical_bars(&self, instrument: &str, period: Period) -> Vec<HistoricalBar> {
        self.inner
            .read()
            .books
            .get(instrument)
            .and_then(|b| b.historical.get(&period))
            .cloned()
            .unwrap_or_default()
    }

    pub fn historical_len(&self, instrument: &str, period: Period) -> usize {
        self.inner
            .read()
            .books
            .get(instrument)
            .and_then(|b| b.historical.get(&period))
            .map_or(0, Vec::len)
    }

    /// Newest entry of the canonical series.
    pub fn newest_historical(&self, instrument: &str, period: Period) -> Option<HistoricalBar> {
        self.inner
            .read()
            .books
            .get(instrument)
            .and_then(|b| b.historical.get(&period))
            .and_then(|s| s.first().cloned())
    }

    pub fn account_info(&self) -> AccountInfo {
        self.inner.read().account.clone()
    }

    /// Instruments that have received any data, sorted.
    pub fn instruments(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().books.keys().cloned().collect();
        names.sort();
        names
    }

    pub(crate) fn counts(&self, instrument: &str) -> (usize, Vec<(Period, usize, usize)>) {
        let inner = self.inner.read();
        let Some(book) = inner.books.get(instrument) else {
            return (0, Period::ALL.iter().map(|p| (*p, 0, 0)).collect());
        };
        let per_period = Period::ALL
            .iter()
            .map(|p| {
                (
                    *p,
                    book.live_bars.get(p).map_or(0, VecDeque::len),
                    book.historical.get(p).map_or(0, Vec::len),
                )
            })
            .collect();
        (book.ticks.len(), per_period)
    }
}

/// Shared handle to the ledger.
pub type SharedLedger = Arc<LedgerStore>;

pub fn create_ledger() -> SharedLedger {
    Arc::new(LedgerStore::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Account, Ohlcv};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn tick(instrument: &str, n: i64) -> Tick {
        Tick {
            produced_at: 1_700_000_000_000 + n,
            timestamp: 1_700_000_000_000 + n,
            pair_id: 1,
            instrument: instrument.to_string(),
            bid: dec!(1.0850) + Decimal::new(n, 5),
            ask: dec!(1.0852) + Decimal::new(n, 5),
            bid_vol: dec!(1),
            ask_vol: dec!(1),
        }
    }

    fn live_bar(end: i64, close: Decimal) -> Bar {
        Bar {
            produced_at: end,
            bar_start_timestamp: end - 60_000,
            bar_end_timestamp: end,
            pair_id: 1,
            instrument: "EURUSD".to_string(),
            period: Period::OneMin,
            bid: Ohlcv {
                c: close,
                ..Default::default()
            },
            ask: Ohlcv::default(),
            vwap: Default::default(),
            emas: Default::default(),
            donchian: Default::default(),
            bollinger: Default::default(),
        }
    }

    #[test]
    fn test_tick_ring_keeps_most_recent() {
        let store = LedgerStore::new();
        for n in 0..25 {
            store.update_tick(tick("EURUSD", n));
        }

        let ticks = store.ticks("EURUSD");
        assert_eq!(ticks.len(), TICK_HISTORY);
        assert_eq!(ticks.first().unwrap().timestamp, 1_700_000_000_005);
        assert_eq!(store.latest_tick("EURUSD").unwrap().timestamp, 1_700_000_000_024);
        assert!(store.ticks("USDJPY").is_empty());
    }

    #[test]
    fn test_live_bar_updates_ring_and_series() {
        let store = LedgerStore::new();
        store.update_live_bar(live_bar(120_000, dec!(1.1)));
        store.update_live_bar(live_bar(180_000, dec!(1.2)));
        // Re-emitted bar with corrected close.
        store.update_live_bar(live_bar(180_000, dec!(1.3)));

        let live = store.live_bars("EURUSD", Period::OneMin);
        assert_eq!(live.len(), 3);

        let series = store.historical_bars("EURUSD", Period::OneMin);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].bar_end_timestamp, 180_000);
        assert_eq!(series[0].bid.c, dec!(1.3));
        assert_eq!(series[0].sequence, 0);
        assert_eq!(store.historical_len("EURUSD", Period::FiveMins), 0);
    }

    #[test]
    fn test_live_ring_bounded() {
        let store = LedgerStore::with_capacity(5, 3);
        for i in 1..=5 {
            store.update_live_bar(live_bar(i * 60_000, dec!(1)));
        }
        assert_eq!(store.live_bars("EURUSD", Period::OneMin).len(), 3);
        assert_eq!(store.historical_len("EURUSD", Period::OneMin), 3);
        assert_eq!(
            store.newest_historical("EURUSD", Period::OneMin).unwrap().bar_end_timestamp,
            300_000
        );
    }

    #[test]
    fn test_account_snapshot_replaced() {
        let store = LedgerStore::new();
        assert_eq!(store.account_info(), AccountInfo::default());

        store.update_account_info(AccountInfo {
            produced_at: 1,
            timestamp: 1,
            account: Account {
                account_id: "A".to_string(),
                balance: dec!(100),
                ..Default::default()
            },
            positions: vec![],
        });
        store.update_account_info(AccountInfo {
            produced_at: 2,
            timestamp: 2,
            account: Account {
                account_id: "A".to_string(),
                balance: dec!(90),
                ..Default::default()
            },
            positions: vec![],
        });

        assert_eq!(store.account_info().account.balance, dec!(90));
    }

    #[test]
    fn test_reads_are_copies() {
        let store = LedgerStore::new();
        store.update_tick(tick("EURUSD", 1));

        let mut copy = store.ticks("EURUSD");
        copy.clear();
        assert_eq!(store.ticks("EURUSD").len(), 1);
    }
}
