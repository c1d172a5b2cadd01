mod config;
mod feed;

use std::sync::Arc;

use audit::{SharedAuditSink, TracingAuditSink};
use control::{ControlCommand, ControlHandler, ControlReply};
use ingest::{CountingAcknowledger, Delivery, IngestionPipeline};
use ledger::create_ledger;
use metrics::create_metrics;
use publisher::{create_outbound_channel, DryRunPublisher, OutboundReceiver, SharedPublisher};
use reconciler::{spawn_freshness_checker, spawn_stats_reporter, Reconciler};
use strategy_runner::StrategyScheduler;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::feed::{body_bytes, FeedError, FeedLine};

type FeedReader = Box<dyn AsyncBufRead + Unpin + Send>;

#[tokio::main]
async fn main() {
    common::init_logging();

    if let Err(e) = run(AppConfig::from_env()).await {
        error!(error = %e, "fx-trader failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), FeedError> {
    info!(
        instruments = ?config.instruments,
        historical_bars = config.historical_bars,
        dry_run = config.dry_run,
        feed = ?config.feed,
        "Starting trading core"
    );

    let reader: FeedReader = match &config.feed {
        Some(path) => Box::new(BufReader::new(File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let ledger = create_ledger();
    let metrics = create_metrics();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let publisher: SharedPublisher = if config.dry_run {
        Arc::new(DryRunPublisher::new())
    } else {
        let (publisher, outbound_rx) = create_outbound_channel(config.outbound_capacity);
        tokio::spawn(forward_outbound(outbound_rx));
        Arc::new(publisher)
    };
    let audit: SharedAuditSink = Arc::new(TracingAuditSink);

    // Ingestion
    let pipeline = IngestionPipeline::new(config.ingest.clone(), ledger.clone(), metrics.clone());
    let mut handles = pipeline.start(shutdown_rx.clone());

    // Reconciliation and monitoring
    let reconciler_config = config.reconciler();
    let reconciler = Arc::new(Reconciler::new(
        reconciler_config.clone(),
        ledger.clone(),
        publisher.clone(),
    ));
    reconciler.request_initial(common::timestamp_ms()).await;
    handles.push(tokio::spawn(reconciler.clone().run(shutdown_rx.clone())));
    handles.push(spawn_stats_reporter(
        ledger.clone(),
        metrics.clone(),
        config.instruments.clone(),
        reconciler_config.stats_interval,
        shutdown_rx.clone(),
    ));
    handles.push(spawn_freshness_checker(
        ledger.clone(),
        config.instruments.clone(),
        reconciler_config.freshness_interval,
        reconciler_config.max_tick_age,
        shutdown_rx.clone(),
    ));

    // Strategies and control
    let scheduler = Arc::new(StrategyScheduler::new(
        config.scheduler.clone(),
        ledger.clone(),
        publisher.clone(),
        audit.clone(),
    ));
    let control = ControlHandler::new(
        ledger.clone(),
        publisher.clone(),
        scheduler.clone(),
        reconciler.clone(),
        audit,
    );

    // Spawn ctrl_c handler
    let ctrl_c_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, initiating shutdown");
            let _ = ctrl_c_tx.send(true);
        }
    });

    let acker = Arc::new(CountingAcknowledger::new());
    let mut feed_shutdown_rx = shutdown_rx.clone();
    let lines = replay(reader, &pipeline, &control, acker.clone(), &mut feed_shutdown_rx).await;
    info!(lines, "Feed finished, waiting for Ctrl+C");

    let mut wait_rx = shutdown_rx;
    while !*wait_rx.borrow() {
        if wait_rx.changed().await.is_err() {
            break;
        }
    }

    scheduler.stop_all().await;
    let _ = shutdown_tx.send(true);
    for handle in handles {
        let _ = handle.await;
    }

    info!(
        acked = acker.acked(),
        rejected = acker.rejected(),
        requeued = acker.requeued(),
        "Deliveries settled"
    );

    // Print final metrics
    let snapshot = metrics.snapshot();
    println!("\n{}", snapshot);

    info!("Shutdown complete");
    Ok(())
}

/// Feed every line to the pipeline or the control handler until EOF or
/// shutdown. Returns the number of lines handled.
async fn replay(
    reader: FeedReader,
    pipeline: &IngestionPipeline,
    control: &ControlHandler,
    acker: Arc<CountingAcknowledger>,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> u64 {
    let mut lines = reader.lines();
    let mut handled: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;

            _ = shutdown_rx.changed() => break,
            next = lines.next_line() => next,
        };

        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "feed read failed");
                break;
            }
        };

        match FeedLine::parse(&line) {
            Ok(None) => continue,
            Ok(Some(FeedLine::Delivery { queue, body })) => {
                handled += 1;
                let delivery = Delivery::new(handled, queue, body_bytes(body), acker.clone());
                if let Err(e) = pipeline.enqueue_routed(delivery) {
                    debug!(error = %e, "delivery not enqueued");
                }
            }
            Ok(Some(FeedLine::Control { control: value })) => {
                handled += 1;
                match ControlCommand::from_value(value) {
                    Ok(command) => match control.handle(command).await {
                        Ok(reply) => print_reply(&reply),
                        Err(e) => debug!(error = %e, "control command rejected"),
                    },
                    Err(e) => warn!(error = %e, "invalid control command"),
                }
            }
            Err(e) => warn!(error = %e, "skipping feed line"),
        }
    }

    handled
}

fn print_reply(reply: &ControlReply) {
    let json = match reply {
        ControlReply::Statuses(statuses) => serde_json::to_string(statuses),
        ControlReply::Health(summary) => serde_json::to_string(summary),
        other => {
            info!(reply = ?other, "control command handled");
            return;
        }
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => warn!(error = %e, "cannot encode control reply"),
    }
}

/// Stand-in transport: log each encoded message.
async fn forward_outbound(mut rx: OutboundReceiver) {
    while let Some(msg) = rx.recv().await {
        info!(
            queue = %msg.queue,
            content_type = msg.content_type,
            body = %msg.body,
            "outbound"
        );
    }
}
