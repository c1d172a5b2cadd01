//! Core strategy types for the trading core.
//!
//! - **Strategy trait**: a pure decision over a newest-first bar series
//! - **Signal**: the decision, `NONE`, `BUY` or `SELL`
//! - **Indicators**: small helpers shared by strategies that derive their own
//!   bands instead of using producer-computed ones
//!
//! # Example Strategy
//!
//! ```rust,ignore
//! use model::HistoricalBar;
//! use strategy_core::{Signal, Strategy};
//!
//! struct AlwaysBuy;
//!
//! impl Strategy for AlwaysBuy {
//!     fn key(&self) -> &'static str {
//!         "ALWAYS_BUY"
//!     }
//!
//!     fn evaluate(&self, bars: &[HistoricalBar]) -> Signal {
//!         if bars.is_empty() { Signal::None } else { Signal::Buy }
//!     }
//! }
//! ```

mod error;
pub mod indicators;
mod signal;
mod strategy;

pub use error::StrategyError;
pub use signal::Signal;
pub use strategy::{param, BoxedStrategy, Params, Strategy};
