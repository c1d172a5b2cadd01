use std::sync::Arc;

use audit::{AuditEvent, EntryIntent, OrderRecord, OrderSource, SharedAuditSink};
use ledger::{HealthSummary, SharedLedger};
use model::{OrderCmd, TradeCommand};
use publisher::SharedPublisher;
use reconciler::Reconciler;
use rust_decimal::Decimal;
use strategy_runner::protection::protective_prices;
use strategy_runner::{RunInfo, SharedScheduler, StartOutcome, StartRequest};
use tracing::{info, warn};

use crate::command::{parse_period, require_instrument, Side};
use crate::{ControlCommand, ControlError};

const DEFAULT_SLIPPAGE_PIPS: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

/// Result of a handled command.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlReply {
    StrategyStarted(StartOutcome),
    /// Id of the stopped run, `None` if nothing was running.
    StrategyStopped(Option<String>),
    Statuses(Vec<RunInfo>),
    Health(HealthSummary),
    BackfillRequested { instrument: String },
    OrderSubmitted { label: String },
    CloseRequested { order_ids: Vec<String> },
}

/// Executes control commands against the running core.
pub struct ControlHandler {
    ledger: SharedLedger,
    publisher: SharedPublisher,
    scheduler: SharedScheduler,
    reconciler: Arc<Reconciler>,
    audit: SharedAuditSink,
}

impl ControlHandler {
    pub fn new(
        ledger: SharedLedger,
        publisher: SharedPublisher,
        scheduler: SharedScheduler,
        reconciler: Arc<Reconciler>,
        audit: SharedAuditSink,
    ) -> Self {
        Self {
            ledger,
            publisher,
            scheduler,
            reconciler,
            audit,
        }
    }

    /// Parse and handle one JSON command.
    pub async fn handle_json(&self, raw: &str) -> Result<ControlReply, ControlError> {
        self.handle(ControlCommand::parse(raw)?).await
    }

    pub async fn handle(&self, command: ControlCommand) -> Result<ControlReply, ControlError> {
        let name = command.name();
        let result = self.dispatch(command).await;
        if let Err(e) = &result {
            warn!(command = name, error = %e, "control command failed");
        }
        result
    }

    async fn dispatch(&self, command: ControlCommand) -> Result<ControlReply, ControlError> {
        match command {
            ControlCommand::StrategyStart {
                instrument,
                strategy_key,
                period,
                qty,
                atr_mult,
                params,
                sl_pips,
            } => {
                let mut request = StartRequest::new(require_instrument(&instrument)?, strategy_key)
                    .with_period(parse_period(period.as_deref())?)
                    .with_qty(qty)
                    .with_atr_mult(atr_mult)
                    .with_params(params);
                if let Some(pips) = sl_pips.filter(|p| *p > Decimal::ZERO) {
                    request = request.with_sl_pips(pips);
                }
                let outcome = self
                    .scheduler
                    .start(request)
                    .map_err(|e| ControlError::invalid(e.to_string()))?;
                Ok(ControlReply::StrategyStarted(outcome))
            }

            ControlCommand::StrategyStop { instrument, period } => {
                let instrument = require_instrument(&instrument)?;
                let period = parse_period(period.as_deref())?;
                Ok(ControlReply::StrategyStopped(
                    self.scheduler.stop(&instrument, period),
                ))
            }

            ControlCommand::StrategyStatus => Ok(ControlReply::Statuses(self.scheduler.statuses())),

            ControlCommand::LedgerHealth => {
                let instruments = &self.reconciler.config().instruments;
                let summary = self.ledger.health_summary(instruments, common::timestamp_ms());
                let incomplete: Vec<&str> = summary
                    .incomplete()
                    .map(|i| i.instrument.as_str())
                    .collect();
                info!(
                    instruments = summary.instruments.len(),
                    incomplete = ?incomplete,
                    "ledger health"
                );
                Ok(ControlReply::Health(summary))
            }

            ControlCommand::HistoricalDataRequest { instrument } => {
                let instrument = require_instrument(&instrument)?;
                info!(instrument = %instrument, "historical data requested");
                self.reconciler
                    .request_now(&instrument, common::timestamp_ms())
                    .await;
                Ok(ControlReply::BackfillRequested { instrument })
            }

            ControlCommand::PlaceOrder {
                instrument,
                side,
                qty,
                sl_pips,
                tp_pips,
                slippage,
            } => {
                let instrument = require_instrument(&instrument)?;
                require_positive("qty", qty)?;
                let tick = self
                    .ledger
                    .latest_tick(&instrument)
                    .ok_or_else(|| ControlError::NoPriceReference(instrument.clone()))?;
                let entry = match side {
                    Side::Buy => tick.ask,
                    Side::Sell => tick.bid,
                };
                let now = common::timestamp_ms();
                let label = format!("{}_{}_{}", instrument, side.as_str().to_ascii_lowercase(), now);
                let slippage = slippage
                    .filter(|s| *s > Decimal::ZERO)
                    .unwrap_or(DEFAULT_SLIPPAGE_PIPS);

                let order = ManualOrder {
                    label,
                    instrument,
                    cmd: side.market_cmd(),
                    qty,
                    entry,
                    sl_pips,
                    tp_pips,
                };
                self.submit(order, None, Some(slippage), now).await
            }

            ControlCommand::PlaceLimit {
                instrument,
                side,
                qty,
                price,
                sl_pips,
                tp_pips,
            } => {
                let instrument = require_instrument(&instrument)?;
                require_positive("qty", qty)?;
                require_positive("price", price)?;
                let now = common::timestamp_ms();
                let label = format!(
                    "{}_{}_limit_{}",
                    instrument,
                    side.as_str().to_ascii_lowercase(),
                    now
                );

                let order = ManualOrder {
                    label,
                    instrument,
                    cmd: side.limit_cmd(),
                    qty,
                    entry: price,
                    sl_pips,
                    tp_pips,
                };
                self.submit(order, Some(price), None, now).await
            }

            ControlCommand::CloseAll { instrument, side } => {
                let instrument = require_instrument(&instrument)?;
                let positions: Vec<_> = self
                    .ledger
                    .account_info()
                    .positions
                    .into_iter()
                    .filter(|p| {
                        p.instrument.eq_ignore_ascii_case(&instrument)
                            && p.order_command.eq_ignore_ascii_case(side.as_str())
                    })
                    .collect();

                let mut order_ids = Vec::with_capacity(positions.len());
                for position in positions {
                    match self
                        .publisher
                        .publish_trade_command(TradeCommand::close(&position.order_id))
                        .await
                    {
                        Ok(()) => {
                            self.record_close(&position.order_id, &position.instrument, &position.order_command);
                            order_ids.push(position.order_id);
                        }
                        Err(e) => {
                            warn!(order_id = %position.order_id, error = %e, "close request failed")
                        }
                    }
                }
                info!(
                    instrument = %instrument,
                    side = %side,
                    count = order_ids.len(),
                    "requested close for positions"
                );
                Ok(ControlReply::CloseRequested { order_ids })
            }

            ControlCommand::CloseOrder {
                order_id,
                instrument,
                side,
            } => {
                let order_id = order_id.trim().to_string();
                if order_id.is_empty() {
                    return Err(ControlError::invalid("missing orderId"));
                }
                self.publisher
                    .publish_trade_command(TradeCommand::close(&order_id))
                    .await?;
                let side = side.map(|s| s.as_str()).unwrap_or_default();
                self.record_close(&order_id, &instrument, side);
                info!(order_id = %order_id, "requested close");
                Ok(ControlReply::CloseRequested {
                    order_ids: vec![order_id],
                })
            }
        }
    }

    async fn submit(
        &self,
        order: ManualOrder,
        limit_price: Option<Decimal>,
        slippage: Option<Decimal>,
        now: i64,
    ) -> Result<ControlReply, ControlError> {
        let pip = model::pip_size(&order.instrument);
        let (stop_loss, take_profit) =
            protective_prices(order.entry, order.cmd, pip, order.sl_pips, order.tp_pips);

        let mut command = TradeCommand::submit(&order.label, &order.instrument, order.cmd, order.qty);
        if let Some(price) = limit_price {
            command = command.with_price(price);
        }
        if let Some(slippage) = slippage {
            command = command.with_slippage(slippage);
        }
        if let Some(sl) = stop_loss {
            command = command.with_stop_loss(sl);
        }
        if let Some(tp) = take_profit {
            command = command.with_take_profit(tp);
        }

        self.audit.record(AuditEvent::OrderSubmitted(OrderRecord {
            ts: now,
            label: order.label.clone(),
            instrument: order.instrument.clone(),
            order_cmd: order.cmd,
            entry_intent: EntryIntent::from(order.cmd),
            amount: order.qty,
            price: order.entry,
            stop_loss,
            take_profit,
            pip_size: pip,
            planned_sl_pips: order.sl_pips.filter(|p| *p > Decimal::ZERO),
            planned_tp_pips: order.tp_pips.filter(|p| *p > Decimal::ZERO),
            source: OrderSource::Manual,
            run_id: None,
            strategy_key: None,
        }));

        info!(
            label = %order.label,
            order_cmd = %order.cmd,
            qty = %order.qty,
            entry = %order.entry,
            sl = ?stop_loss,
            tp = ?take_profit,
            "submitting manual order"
        );
        self.publisher.publish_trade_command(command).await?;
        Ok(ControlReply::OrderSubmitted { label: order.label })
    }

    fn record_close(&self, order_id: &str, instrument: &str, side: &str) {
        self.audit.record(AuditEvent::CloseRequested {
            ts: common::timestamp_ms(),
            order_id: order_id.to_string(),
            instrument: instrument.to_string(),
            side: side.to_string(),
        });
    }
}

struct ManualOrder {
    label: String,
    instrument: String,
    cmd: OrderCmd,
    qty: Decimal,
    /// Reference price for protective levels.
    entry: Decimal,
    sl_pips: Option<Decimal>,
    tp_pips: Option<Decimal>,
}

fn require_positive(field: &str, value: Decimal) -> Result<(), ControlError> {
    if value <= Decimal::ZERO {
        return Err(ControlError::invalid(format!("{field} must be positive")));
    }
    Ok(())
}
