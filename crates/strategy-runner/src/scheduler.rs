//! Per-instrument strategy runs.
//!
//! At most one run exists per (instrument, period). Each run is a tokio task
//! polling the canonical series and acting at most once per closed bar. A
//! bar counts as new only when it closes after the last evaluated one.

use std::sync::Arc;
use std::time::Duration;

use audit::{AuditEvent, EntryIntent, OrderRecord, OrderSource, RunStatus, SharedAuditSink};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use ledger::SharedLedger;
use model::{HistoricalBar, Period, TradeCommand};
use parking_lot::Mutex;
use publisher::SharedPublisher;
use rust_decimal::Decimal;
use serde::Serialize;
use strategy_core::{BoxedStrategy, Params, Signal};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SchedulerConfig;
use crate::error::SchedulerError;
use crate::protection::{self, ProtectionPlan};
use crate::strategies::strategy_for_key;

const DEFAULT_QTY: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
const MAX_QTY: Decimal = Decimal::from_parts(100, 0, 0, false, 0);
const MAX_ATR_MULT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Quantity guardrail: non-positive becomes 0.10, above 100 becomes 100.
pub fn clamp_qty(qty: Decimal) -> Decimal {
    if qty <= Decimal::ZERO {
        DEFAULT_QTY
    } else {
        qty.min(MAX_QTY)
    }
}

/// ATR multiplier guardrail: non-positive becomes 1, above 20 becomes 20.
pub fn clamp_atr_mult(mult: Decimal) -> Decimal {
    if mult <= Decimal::ZERO {
        Decimal::ONE
    } else {
        mult.min(MAX_ATR_MULT)
    }
}

/// Parameters of a run to start.
#[derive(Debug, Clone)]
pub struct StartRequest {
    pub instrument: String,
    pub period: Period,
    pub strategy_key: String,
    pub qty: Decimal,
    pub atr_mult: Decimal,
    pub params: Params,
    /// Fixed stop distance in pips, overriding the ATR-derived one.
    pub sl_pips: Option<Decimal>,
}

impl StartRequest {
    pub fn new(instrument: impl Into<String>, strategy_key: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            period: Period::default(),
            strategy_key: strategy_key.into(),
            qty: DEFAULT_QTY,
            atr_mult: Decimal::ONE,
            params: Params::new(),
            sl_pips: None,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_qty(mut self, qty: Decimal) -> Self {
        self.qty = qty;
        self
    }

    pub fn with_atr_mult(mut self, atr_mult: Decimal) -> Self {
        self.atr_mult = atr_mult;
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn with_sl_pips(mut self, pips: Decimal) -> Self {
        self.sl_pips = Some(pips);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { run_id: String },
    /// A run already exists for the key; nothing was changed.
    AlreadyRunning { run_id: String },
}

impl StartOutcome {
    pub fn run_id(&self) -> &str {
        match self {
            StartOutcome::Started { run_id } | StartOutcome::AlreadyRunning { run_id } => run_id,
        }
    }
}

/// Status of one active run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub instrument: String,
    pub period: Period,
    pub key: String,
    pub run_id: String,
    pub running: bool,
    pub last_signal: Signal,
    /// Time (ms) of the last order, 0 if none.
    pub last_action_at: i64,
}

#[derive(Debug, Default)]
struct RunState {
    last_signal: Signal,
    last_action_at: i64,
}

struct RunHandle {
    run_id: String,
    strategy_key: &'static str,
    state: Arc<Mutex<RunState>>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

type RunKey = (String, Period);

/// Owns every strategy run.
pub struct StrategyScheduler {
    config: SchedulerConfig,
    ledger: SharedLedger,
    publisher: SharedPublisher,
    audit: SharedAuditSink,
    runs: DashMap<RunKey, RunHandle>,
}

pub type SharedScheduler = Arc<StrategyScheduler>;

impl StrategyScheduler {
    pub fn new(
        config: SchedulerConfig,
        ledger: SharedLedger,
        publisher: SharedPublisher,
        audit: SharedAuditSink,
    ) -> Self {
        Self {
            config,
            ledger,
            publisher,
            audit,
            runs: DashMap::new(),
        }
    }

    /// Start a run unless one already exists for the instrument and period.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: StartRequest) -> Result<StartOutcome, SchedulerError> {
        let instrument = request.instrument.trim().to_ascii_uppercase();
        if instrument.is_empty() {
            return Err(SchedulerError::MissingInstrument);
        }
        let period = request.period;

        let slot = match self.runs.entry((instrument.clone(), period)) {
            Entry::Occupied(existing) => {
                let run_id = existing.get().run_id.clone();
                info!(
                    instrument = %instrument,
                    period = %period,
                    run_id = %run_id,
                    "strategy already running"
                );
                return Ok(StartOutcome::AlreadyRunning { run_id });
            }
            Entry::Vacant(slot) => slot,
        };

        let qty = clamp_qty(request.qty);
        let atr_mult = clamp_atr_mult(request.atr_mult);
        let mut strategy = strategy_for_key(&request.strategy_key);
        for rejected in strategy.set_params(&request.params) {
            warn!(instrument = %instrument, error = %rejected, "ignoring strategy parameter");
        }

        let run_id = Uuid::new_v4().as_simple().to_string();
        let strategy_key = strategy.key();
        let state = Arc::new(Mutex::new(RunState::default()));
        let (cancel, cancel_rx) = watch::channel(false);

        info!(
            instrument = %instrument,
            period = %period,
            strategy = strategy_key,
            run_id = %run_id,
            qty = %qty,
            atr_mult = %atr_mult,
            sl_pips = ?request.sl_pips,
            params = ?request.params,
            "strategy started"
        );
        self.audit.record(AuditEvent::RunStarted {
            ts: common::timestamp_ms(),
            run_id: run_id.clone(),
            instrument: instrument.clone(),
            period,
            strategy_key: strategy_key.to_string(),
            qty,
            atr_mult,
            params: request.params.clone(),
        });

        let task = RunTask {
            run_id: run_id.clone(),
            instrument,
            period,
            strategy,
            qty,
            atr_mult,
            sl_pips: request.sl_pips,
            config: self.config.clone(),
            ledger: self.ledger.clone(),
            publisher: self.publisher.clone(),
            audit: self.audit.clone(),
            state: state.clone(),
        };
        let task = tokio::spawn(task.run(cancel_rx));

        slot.insert(RunHandle {
            run_id: run_id.clone(),
            strategy_key,
            state,
            cancel,
            task,
        });
        Ok(StartOutcome::Started { run_id })
    }

    /// Stop the run for the instrument and period. Returns its id, or `None`
    /// when nothing was running.
    pub fn stop(&self, instrument: &str, period: Period) -> Option<String> {
        let key = (instrument.trim().to_ascii_uppercase(), period);
        let Some((_, handle)) = self.runs.remove(&key) else {
            debug!(instrument = %key.0, period = %period, "no strategy running");
            return None;
        };
        let run_id = handle.run_id.clone();
        self.finish(&key, handle, RunStatus::Stopped);
        Some(run_id)
    }

    /// Stop every run and wait for the polling tasks to exit.
    pub async fn stop_all(&self) {
        let keys: Vec<RunKey> = self.runs.iter().map(|r| r.key().clone()).collect();
        let mut tasks = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some((_, handle)) = self.runs.remove(&key) {
                tasks.push(self.finish(&key, handle, RunStatus::Shutdown));
            }
        }

        let grace = self.config.poll_interval + Duration::from_secs(5);
        for task in tasks {
            if tokio::time::timeout(grace, task).await.is_err() {
                warn!("strategy task did not stop in time");
            }
        }
    }

    pub fn is_running(&self, instrument: &str, period: Period) -> bool {
        self.runs
            .contains_key(&(instrument.trim().to_ascii_uppercase(), period))
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Active runs ordered by instrument and period.
    pub fn statuses(&self) -> Vec<RunInfo> {
        let mut infos: Vec<RunInfo> = self
            .runs
            .iter()
            .map(|entry| {
                let (instrument, period) = entry.key();
                let handle = entry.value();
                let state = handle.state.lock();
                RunInfo {
                    instrument: instrument.clone(),
                    period: *period,
                    key: handle.strategy_key.to_string(),
                    run_id: handle.run_id.clone(),
                    running: !handle.task.is_finished(),
                    last_signal: state.last_signal,
                    last_action_at: state.last_action_at,
                }
            })
            .collect();
        infos.sort_by(|a, b| (&a.instrument, a.period).cmp(&(&b.instrument, b.period)));
        infos
    }

    fn finish(&self, key: &RunKey, handle: RunHandle, status: RunStatus) -> JoinHandle<()> {
        let _ = handle.cancel.send(true);
        info!(
            instrument = %key.0,
            period = %key.1,
            run_id = %handle.run_id,
            status = %status,
            "strategy stopped"
        );
        self.audit.record(AuditEvent::RunStopped {
            ts: common::timestamp_ms(),
            run_id: handle.run_id,
            status,
        });
        handle.task
    }
}

/// State owned by one polling task.
struct RunTask {
    run_id: String,
    instrument: String,
    period: Period,
    strategy: BoxedStrategy,
    qty: Decimal,
    atr_mult: Decimal,
    sl_pips: Option<Decimal>,
    config: SchedulerConfig,
    ledger: SharedLedger,
    publisher: SharedPublisher,
    audit: SharedAuditSink,
    state: Arc<Mutex<RunState>>,
}

impl RunTask {
    async fn run(self, mut cancel_rx: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        let mut last_evaluated: Option<i64> = None;

        loop {
            tokio::select! {
                biased;

                changed = cancel_rx.changed() => {
                    if changed.is_err() || *cancel_rx.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.poll(&mut last_evaluated).await;
                }
            }
        }

        debug!(run_id = %self.run_id, "polling task exited");
    }

    /// Evaluate when the newest bar closes after the last evaluated one.
    async fn poll(&self, last_evaluated: &mut Option<i64>) {
        let Some(newest) = self.ledger.newest_historical(&self.instrument, self.period) else {
            return;
        };
        if !closes_after(newest.bar_end_timestamp, *last_evaluated) {
            return;
        }

        let bars = self.ledger.historical_bars(&self.instrument, self.period);
        let Some(newest) = bars.first() else {
            return;
        };
        if !closes_after(newest.bar_end_timestamp, *last_evaluated) {
            return;
        }
        *last_evaluated = Some(newest.bar_end_timestamp);

        let signal = self.strategy.evaluate(&bars);
        if signal.is_actionable() {
            self.act(signal, newest).await;
        }
    }

    async fn act(&self, signal: Signal, newest: &HistoricalBar) {
        let (Some(cmd), Some(plan)) = (signal.order_cmd(), self.plan(signal, newest)) else {
            return;
        };
        let now = common::timestamp_ms();
        let label = protection::order_label(&self.instrument, signal, now);

        {
            let mut state = self.state.lock();
            state.last_signal = signal;
            state.last_action_at = now;
        }

        info!(
            run_id = %self.run_id,
            instrument = %self.instrument,
            period = %self.period,
            signal = %signal,
            bar_end = newest.bar_end_timestamp,
            sequence = newest.sequence,
            "strategy signal"
        );
        self.audit.record(AuditEvent::SignalEmitted {
            ts: now,
            run_id: self.run_id.clone(),
            instrument: self.instrument.clone(),
            period: self.period,
            strategy_key: self.strategy.key().to_string(),
            signal: signal.to_string(),
            bar_end_timestamp: newest.bar_end_timestamp,
            sequence: newest.sequence,
        });

        let command = TradeCommand::submit(&label, &self.instrument, cmd, self.qty)
            .with_slippage(self.config.slippage_pips)
            .with_stop_loss(plan.stop_loss)
            .with_take_profit(plan.take_profit);

        self.audit.record(AuditEvent::OrderSubmitted(OrderRecord {
            ts: now,
            label: label.clone(),
            instrument: self.instrument.clone(),
            order_cmd: cmd,
            entry_intent: EntryIntent::from(cmd),
            amount: self.qty,
            price: plan.entry_mid,
            stop_loss: Some(plan.stop_loss),
            take_profit: Some(plan.take_profit),
            pip_size: plan.pip_size,
            planned_sl_pips: Some(plan.sl_pips),
            planned_tp_pips: Some(plan.sl_pips),
            source: OrderSource::Strategy,
            run_id: Some(self.run_id.clone()),
            strategy_key: Some(self.strategy.key().to_string()),
        }));

        info!(
            label = %label,
            side = %cmd,
            qty = %self.qty,
            mid = %plan.entry_mid,
            sl = %plan.stop_loss,
            tp = %plan.take_profit,
            sl_pips = %plan.sl_pips,
            "submitting strategy order"
        );
        if let Err(e) = self.publisher.publish_trade_command(command).await {
            error!(label = %label, error = %e, "failed to publish strategy order");
        }
    }

    fn plan(&self, signal: Signal, newest: &HistoricalBar) -> Option<ProtectionPlan> {
        protection::plan(
            newest,
            signal,
            model::pip_size(&self.instrument),
            self.atr_mult,
            self.sl_pips,
            self.config.default_sl_pips,
            self.config.min_sl_pips,
        )
    }
}

fn closes_after(bar_end: i64, last_evaluated: Option<i64>) -> bool {
    last_evaluated.map_or(true, |last| bar_end > last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit::{create_audit_channel, AuditReceiver};
    use ledger::create_ledger;
    use publisher::DryRunPublisher;
    use rust_decimal_macros::dec;

    fn scheduler() -> (StrategyScheduler, AuditReceiver) {
        let (audit, rx) = create_audit_channel(64);
        let scheduler = StrategyScheduler::new(
            SchedulerConfig::default().with_poll_interval(Duration::from_millis(10)),
            create_ledger(),
            Arc::new(DryRunPublisher::new()),
            Arc::new(audit),
        );
        (scheduler, rx)
    }

    #[test]
    fn test_closes_after() {
        assert!(closes_after(60_000, None));
        assert!(closes_after(120_000, Some(60_000)));
        assert!(!closes_after(60_000, Some(60_000)));
        assert!(!closes_after(0, Some(60_000)));
    }

    #[test]
    fn test_guardrails() {
        assert_eq!(clamp_qty(dec!(0)), dec!(0.10));
        assert_eq!(clamp_qty(dec!(-3)), dec!(0.10));
        assert_eq!(clamp_qty(dec!(0.5)), dec!(0.5));
        assert_eq!(clamp_qty(dec!(250)), dec!(100));
        assert_eq!(clamp_atr_mult(dec!(0)), dec!(1));
        assert_eq!(clamp_atr_mult(dec!(2.5)), dec!(2.5));
        assert_eq!(clamp_atr_mult(dec!(50)), dec!(20));
    }

    #[tokio::test]
    async fn test_second_start_is_noop() {
        let (scheduler, mut audit) = scheduler();

        let first = scheduler
            .start(StartRequest::new("EURUSD", "DEMA_RSI"))
            .unwrap();
        let second = scheduler
            .start(StartRequest::new("eurusd", "BREAKOUT_DC").with_qty(dec!(5)))
            .unwrap();

        assert!(matches!(first, StartOutcome::Started { .. }));
        assert_eq!(second, StartOutcome::AlreadyRunning { run_id: first.run_id().to_string() });
        assert_eq!(scheduler.run_count(), 1);

        let statuses = scheduler.statuses();
        assert_eq!(statuses[0].key, "DEMA_RSI");
        assert_eq!(statuses[0].last_signal, Signal::None);
        assert_eq!(statuses[0].last_action_at, 0);

        // Only one RunStarted went to the audit trail.
        assert!(matches!(audit.try_recv(), Ok(AuditEvent::RunStarted { .. })));
        assert!(audit.try_recv().is_err());

        scheduler.stop_all().await;
    }

    #[tokio::test]
    async fn test_same_instrument_other_period_is_separate() {
        let (scheduler, _audit) = scheduler();
        scheduler.start(StartRequest::new("EURUSD", "DEMA")).unwrap();
        scheduler
            .start(StartRequest::new("EURUSD", "DEMA").with_period(Period::FiveMins))
            .unwrap();
        assert_eq!(scheduler.run_count(), 2);
        scheduler.stop_all().await;
    }

    #[tokio::test]
    async fn test_stop_unknown_is_noop() {
        let (scheduler, mut audit) = scheduler();
        assert_eq!(scheduler.stop("GBPUSD", Period::OneMin), None);
        assert!(audit.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stop_records_status() {
        let (scheduler, mut audit) = scheduler();
        let run_id = scheduler
            .start(StartRequest::new("USDJPY", "SUPERTREND_TREND"))
            .unwrap()
            .run_id()
            .to_string();

        assert_eq!(scheduler.stop("USDJPY", Period::OneMin), Some(run_id.clone()));
        assert!(!scheduler.is_running("USDJPY", Period::OneMin));
        assert!(scheduler.statuses().is_empty());

        let _started = audit.recv().await.unwrap();
        match audit.recv().await.unwrap() {
            AuditEvent::RunStopped { run_id: id, status, .. } => {
                assert_eq!(id, run_id);
                assert_eq!(status, RunStatus::Stopped);
            }
            other => panic!("unexpected event {other:?}"),
        }

        // A fresh run can be started on the same key.
        let again = scheduler.start(StartRequest::new("USDJPY", "DEMA")).unwrap();
        assert!(matches!(again, StartOutcome::Started { .. }));
        assert_ne!(again.run_id(), run_id);
        scheduler.stop_all().await;
    }

    #[tokio::test]
    async fn test_missing_instrument() {
        let (scheduler, _audit) = scheduler();
        assert_eq!(
            scheduler.start(StartRequest::new("  ", "DEMA_RSI")),
            Err(SchedulerError::MissingInstrument)
        );
    }

    #[tokio::test]
    async fn test_stop_all_uses_shutdown_status() {
        let (scheduler, mut audit) = scheduler();
        scheduler.start(StartRequest::new("EURUSD", "DEMA")).unwrap();
        scheduler.stop_all().await;
        assert_eq!(scheduler.run_count(), 0);

        let _started = audit.recv().await.unwrap();
        assert!(matches!(
            audit.recv().await.unwrap(),
            AuditEvent::RunStopped {
                status: RunStatus::Shutdown,
                ..
            }
        ));
    }
}
