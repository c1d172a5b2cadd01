//! In-memory market ledger.
//!
//! Holds, per instrument:
//!
//! - a ring of the most recent ticks
//! - a ring of recent live bars per period
//! - the canonical historical series per period: newest-first, unique by
//!   close time, bounded
//!
//! plus the latest account snapshot. Both live-bar completions and bulk
//! historical responses write into the same canonical series; that series is
//! what strategies and reconciliation read.

mod health;
mod series;
mod store;

pub use health::{
    HealthSummary, InstrumentHealth, InstrumentStats, LedgerStats, PeriodHealth, PeriodStats,
    TicksHealth, LIVE_TICK_WINDOW_MS, MIN_VALID_BARS,
};
pub use series::is_canonical;
pub use store::{create_ledger, LedgerStore, SharedLedger, BAR_HISTORY, TICK_HISTORY};
