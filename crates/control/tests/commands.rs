use std::sync::Arc;
use std::time::Duration;

use audit::{create_audit_channel, AuditEvent, AuditReceiver, OrderSource};
use control::{ControlError, ControlHandler, ControlReply};
use ledger::{create_ledger, SharedLedger};
use model::{AccountInfo, OrderCmd, Period, Position, Tick, TradeCommand};
use publisher::{create_outbound_channel, OutboundReceiver};
use reconciler::{Reconciler, ReconcilerConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use strategy_runner::{SchedulerConfig, StartOutcome, StrategyScheduler};

struct Harness {
    ledger: SharedLedger,
    handler: ControlHandler,
    scheduler: Arc<StrategyScheduler>,
    outbound: OutboundReceiver,
    audit: AuditReceiver,
}

fn harness() -> Harness {
    let ledger = create_ledger();
    let (publisher, outbound) = create_outbound_channel(32);
    let publisher = Arc::new(publisher);
    let (audit_sink, audit) = create_audit_channel(64);
    let audit_sink = Arc::new(audit_sink);

    let scheduler = Arc::new(StrategyScheduler::new(
        SchedulerConfig::default().with_poll_interval(Duration::from_millis(50)),
        ledger.clone(),
        publisher.clone(),
        audit_sink.clone(),
    ));
    let reconciler = Arc::new(Reconciler::new(
        ReconcilerConfig::default().with_instruments(vec!["EURUSD".into(), "USDJPY".into()]),
        ledger.clone(),
        publisher.clone(),
    ));
    let handler = ControlHandler::new(
        ledger.clone(),
        publisher,
        scheduler.clone(),
        reconciler,
        audit_sink,
    );

    Harness {
        ledger,
        handler,
        scheduler,
        outbound,
        audit,
    }
}

fn tick(instrument: &str, bid: Decimal, ask: Decimal) -> Tick {
    Tick {
        produced_at: 1,
        timestamp: 1,
        pair_id: 1,
        instrument: instrument.to_string(),
        bid,
        ask,
        bid_vol: dec!(1),
        ask_vol: dec!(1),
    }
}

fn trade(rx: &mut OutboundReceiver) -> TradeCommand {
    rx.try_recv()
        .expect("nothing published")
        .as_trade_command()
        .expect("not a trade command")
}

fn close_to(actual: Option<Decimal>, expected: Decimal) -> bool {
    actual.is_some_and(|a| (a - expected).abs() < dec!(0.0000001))
}

#[tokio::test]
async fn strategy_start_stop_lifecycle() {
    let h = harness();
    let start = r#"{"type":"STRATEGY_START","instrument":"EURUSD","strategyKey":"DEMA_RSI","qty":0.1,"atrMult":2}"#;

    let first = h.handler.handle_json(start).await.unwrap();
    let run_id = match first {
        ControlReply::StrategyStarted(StartOutcome::Started { run_id }) => run_id,
        other => panic!("unexpected {other:?}"),
    };
    assert_eq!(
        h.handler.handle_json(start).await.unwrap(),
        ControlReply::StrategyStarted(StartOutcome::AlreadyRunning {
            run_id: run_id.clone()
        })
    );

    match h.handler.handle_json(r#"{"type":"STRATEGY_STATUS"}"#).await.unwrap() {
        ControlReply::Statuses(statuses) => {
            assert_eq!(statuses.len(), 1);
            assert_eq!(statuses[0].period, Period::OneMin);
            assert_eq!(statuses[0].run_id, run_id);
        }
        other => panic!("unexpected {other:?}"),
    }

    let stop = r#"{"type":"STRATEGY_STOP","instrument":"EURUSD"}"#;
    assert_eq!(
        h.handler.handle_json(stop).await.unwrap(),
        ControlReply::StrategyStopped(Some(run_id))
    );
    assert_eq!(
        h.handler.handle_json(stop).await.unwrap(),
        ControlReply::StrategyStopped(None)
    );
    assert_eq!(h.scheduler.run_count(), 0);
}

#[tokio::test]
async fn strategy_start_requires_instrument() {
    let h = harness();
    let err = h
        .handler
        .handle_json(r#"{"type":"STRATEGY_START","strategyKey":"DEMA_RSI"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidCommand(_)));
    assert_eq!(h.scheduler.run_count(), 0);
}

#[tokio::test]
async fn market_order_needs_a_tick() {
    let mut h = harness();
    let order = r#"{"type":"PLACE_ORDER","instrument":"EURUSD","side":"BUY","qty":0.1,"slPips":10,"tpPips":20}"#;

    let err = h.handler.handle_json(order).await.unwrap_err();
    assert!(matches!(err, ControlError::NoPriceReference(_)));
    assert!(h.outbound.try_recv().is_err());

    h.ledger.update_tick(tick("EURUSD", dec!(1.1000), dec!(1.1002)));
    let reply = h.handler.handle_json(order).await.unwrap();
    assert!(matches!(reply, ControlReply::OrderSubmitted { ref label } if label.starts_with("EURUSD_buy_")));

    let cmd = trade(&mut h.outbound);
    assert_eq!(cmd.order_cmd, Some(OrderCmd::Buy));
    assert_eq!(cmd.price, None);
    assert!(close_to(cmd.slippage, dec!(5)));
    // Buys are priced from the ask.
    assert!(close_to(cmd.stop_loss_price, dec!(1.0992)));
    assert!(close_to(cmd.take_profit_price, dec!(1.1022)));

    match h.audit.try_recv().unwrap() {
        AuditEvent::OrderSubmitted(record) => {
            assert_eq!(record.source, OrderSource::Manual);
            assert_eq!(record.price, dec!(1.1002));
            assert_eq!(record.run_id, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn limit_order_on_jpy_pair() {
    let mut h = harness();
    h.handler
        .handle_json(r#"{"type":"PLACE_LIMIT","instrument":"USDJPY","side":"SELL","qty":0.2,"price":150.50,"slPips":25}"#)
        .await
        .unwrap();

    let cmd = trade(&mut h.outbound);
    assert_eq!(cmd.order_cmd, Some(OrderCmd::SellLimit));
    assert!(close_to(cmd.price, dec!(150.50)));
    assert!(close_to(cmd.stop_loss_price, dec!(150.75)));
    assert_eq!(cmd.take_profit_price, None);
    assert!(cmd.label.starts_with("USDJPY_sell_limit_"));

    let err = h
        .handler
        .handle_json(r#"{"type":"PLACE_LIMIT","instrument":"USDJPY","side":"SELL","qty":0.2}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidCommand(_)));
}

#[tokio::test]
async fn close_all_targets_matching_positions() {
    let mut h = harness();
    let position = |id: &str, instrument: &str, side: &str| Position {
        order_id: id.to_string(),
        instrument: instrument.to_string(),
        order_command: side.to_string(),
        ..Default::default()
    };
    h.ledger.update_account_info(AccountInfo {
        positions: vec![
            position("1", "EURUSD", "BUY"),
            position("2", "EURUSD", "SELL"),
            position("3", "EURUSD", "buy"),
            position("4", "GBPUSD", "BUY"),
        ],
        ..Default::default()
    });

    let reply = h
        .handler
        .handle_json(r#"{"type":"CLOSE_ALL","instrument":"EURUSD","side":"BUY"}"#)
        .await
        .unwrap();
    assert_eq!(
        reply,
        ControlReply::CloseRequested {
            order_ids: vec!["1".to_string(), "3".to_string()]
        }
    );
    assert_eq!(trade(&mut h.outbound).order_id, "1");
    assert_eq!(trade(&mut h.outbound).order_id, "3");
    assert!(h.outbound.try_recv().is_err());
}

#[tokio::test]
async fn close_order_requires_id() {
    let mut h = harness();
    let err = h
        .handler
        .handle_json(r#"{"type":"CLOSE_ORDER","orderId":"  "}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, ControlError::InvalidCommand(_)));

    h.handler
        .handle_json(r#"{"type":"CLOSE_ORDER","orderId":"77"}"#)
        .await
        .unwrap();
    assert_eq!(trade(&mut h.outbound).order_id, "77");
    assert!(matches!(
        h.audit.try_recv().unwrap(),
        AuditEvent::CloseRequested { .. }
    ));
}

#[tokio::test]
async fn historical_request_publishes_backfill() {
    let mut h = harness();
    let reply = h
        .handler
        .handle_json(r#"{"type":"HISTORICAL_DATA_REQUEST","instrument":"gbpusd"}"#)
        .await
        .unwrap();
    assert_eq!(
        reply,
        ControlReply::BackfillRequested {
            instrument: "GBPUSD".to_string()
        }
    );

    let msg = h.outbound.try_recv().unwrap();
    assert_eq!(msg.queue, "GBPUSD_H-Requests");
    assert_eq!(msg.body, "instrument:GBPUSD,barsCount:200");
}

#[tokio::test]
async fn ledger_health_covers_configured_instruments() {
    let h = harness();
    match h.handler.handle_json(r#"{"type":"LEDGER_HEALTH"}"#).await.unwrap() {
        ControlReply::Health(summary) => {
            let names: Vec<_> = summary.instruments.iter().map(|i| i.instrument.as_str()).collect();
            assert_eq!(names, vec!["EURUSD", "USDJPY"]);
            assert_eq!(summary.incomplete().count(), 2);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn garbage_is_a_parse_error() {
    let h = harness();
    assert!(matches!(
        h.handler.handle_json("not json").await,
        Err(ControlError::Parse(_))
    ));
}
