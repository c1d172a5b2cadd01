//! Strategy scheduling for the trading core.
//!
//! ```text
//! ┌────────────────┐ poll 1s ┌─────────────┐ new bar? ┌──────────┐ BUY/SELL ┌───────────┐
//! │  LedgerStore   │<────────│  run task   │─────────>│ Strategy │─────────>│ Publisher │
//! │ canonical bars │         │ (per key)   │          │ evaluate │  SL/TP   │ + audit   │
//! └────────────────┘         └─────────────┘          └──────────┘          └───────────┘
//! ```
//!
//! [`StrategyScheduler`] keeps at most one run per (instrument, period).

mod config;
mod error;
pub mod protection;
mod scheduler;
pub mod strategies;

pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use protection::ProtectionPlan;
pub use scheduler::{
    clamp_atr_mult, clamp_qty, RunInfo, SharedScheduler, StartOutcome, StartRequest,
    StrategyScheduler,
};
pub use strategies::{strategy_for_key, try_strategy_for_key};
