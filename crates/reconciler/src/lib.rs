//! Backfill reconciliation and ledger monitoring.
//!
//! The [`Reconciler`] wakes every 15 s and, for each instrument with any
//! period below target, publishes one backfill request unless one went out
//! within the cooldown. A backfill replenishes all periods of an instrument.

mod config;
mod monitor;
mod reconciler;

pub use config::ReconcilerConfig;
pub use monitor::{spawn_freshness_checker, spawn_stats_reporter, stale_instruments, TickFreshness};
pub use reconciler::Reconciler;
