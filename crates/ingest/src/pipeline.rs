//! Bounded per-class queues drained by worker pools.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use ledger::SharedLedger;
use metrics::SharedMetrics;
use model::MessageClass;

use crate::config::IngestConfig;
use crate::delivery::Delivery;
use crate::error::IngestError;
use crate::message::Message;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::Receiver<Delivery>>>;

struct ClassQueue {
    tx: mpsc::Sender<Delivery>,
    /// Taken by `start`.
    rx: Mutex<Option<mpsc::Receiver<Delivery>>>,
}

/// What a worker needs to process a delivery.
#[derive(Clone)]
struct WorkerContext {
    ledger: SharedLedger,
    metrics: SharedMetrics,
    stale_threshold_ms: i64,
}

/// The ingestion pipeline.
///
/// Queues exist from construction, so deliveries can be enqueued before the
/// workers start. Enqueue never blocks: a full queue sheds the delivery.
pub struct IngestionPipeline {
    config: IngestConfig,
    queues: Vec<ClassQueue>,
    ctx: WorkerContext,
}

impl IngestionPipeline {
    pub fn new(config: IngestConfig, ledger: SharedLedger, metrics: SharedMetrics) -> Self {
        let queues = MessageClass::ALL
            .iter()
            .map(|class| {
                let (tx, rx) = mpsc::channel(config.capacity(*class));
                ClassQueue {
                    tx,
                    rx: Mutex::new(Some(rx)),
                }
            })
            .collect();

        let ctx = WorkerContext {
            ledger,
            metrics,
            stale_threshold_ms: config.stale_threshold.as_millis() as i64,
        };

        Self {
            config,
            queues,
            ctx,
        }
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Deliveries waiting in a class queue.
    pub fn queue_len(&self, class: MessageClass) -> usize {
        let queue = &self.queues[class.index()];
        self.config.capacity(class) - queue.tx.capacity()
    }

    /// Hand a delivery to the queue of its class without blocking.
    ///
    /// A full queue rejects the delivery without requeue; a stopped pipeline
    /// rejects it with requeue so the broker can redeliver.
    pub fn enqueue(&self, class: MessageClass, delivery: Delivery) -> Result<(), IngestError> {
        self.ctx.metrics.inc_received(class);

        match self.queues[class.index()].tx.try_send(delivery) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(delivery)) => {
                warn!(
                    class = %class,
                    routing_key = %delivery.routing_key,
                    "queue full, discarding message"
                );
                self.ctx.metrics.inc_dropped(class);
                delivery.reject(false);
                Err(IngestError::QueueFull(class))
            }
            Err(TrySendError::Closed(delivery)) => {
                debug!(class = %class, "pipeline stopped, requeueing message");
                delivery.reject(true);
                Err(IngestError::Closed(class))
            }
        }
    }

    /// Route a delivery by the queue it was consumed from.
    pub fn enqueue_routed(&self, delivery: Delivery) -> Result<(), IngestError> {
        match MessageClass::from_queue(&delivery.routing_key) {
            Some(class) => self.enqueue(class, delivery),
            None => {
                let queue = delivery.routing_key.clone();
                warn!(queue = %queue, "no handler for queue, rejecting");
                delivery.reject(false);
                Err(IngestError::UnknownQueue(queue))
            }
        }
    }

    /// Spawn the worker pools.
    ///
    /// Workers exit when `shutdown_rx` turns true, after draining what is
    /// already queued. Calling this twice spawns nothing the second time.
    pub fn start(&self, shutdown_rx: watch::Receiver<bool>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        for class in MessageClass::ALL {
            let Some(rx) = self.queues[class.index()].rx.lock().take() else {
                warn!(class = %class, "workers already started");
                continue;
            };
            let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));

            for worker_id in 0..self.config.workers(class) {
                let ctx = self.ctx.clone();
                let rx = rx.clone();
                let shutdown_rx = shutdown_rx.clone();
                handles.push(tokio::spawn(async move {
                    run_worker(class, worker_id, ctx, rx, shutdown_rx).await;
                }));
            }
        }

        info!(workers = handles.len(), "ingestion workers started");
        handles
    }
}

async fn run_worker(
    class: MessageClass,
    worker_id: usize,
    ctx: WorkerContext,
    rx: SharedReceiver,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    debug!(class = %class, worker_id, "worker started");
    let mut processed: u64 = 0;

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // Only one worker waits on the receiver at a time; processing happens
        // after the lock is released.
        let next = {
            let mut rx = rx.lock().await;
            tokio::select! {
                biased;

                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }

                delivery = rx.recv() => delivery,
            }
        };

        match next {
            Some(delivery) => {
                process_delivery(class, &ctx, delivery);
                processed += 1;
            }
            None => break,
        }
    }

    // Best-effort drain of what was accepted before shutdown.
    let mut rx = rx.lock().await;
    while let Ok(delivery) = rx.try_recv() {
        process_delivery(class, &ctx, delivery);
        processed += 1;
    }

    debug!(class = %class, worker_id, processed, "worker stopped");
}

/// Parse, filter stale, apply, acknowledge.
fn process_delivery(class: MessageClass, ctx: &WorkerContext, delivery: Delivery) {
    let message = match Message::decode(class, &delivery.body) {
        Ok(m) => m,
        Err(e) => {
            warn!(error = %e, routing_key = %delivery.routing_key, "discarding malformed message");
            ctx.metrics.inc_malformed(class);
            delivery.reject(false);
            return;
        }
    };

    if message.is_stale(common::timestamp_ms(), ctx.stale_threshold_ms) {
        ctx.metrics.inc_stale(class);
        delivery.ack();
        return;
    }

    match &message {
        Message::LiveBar(bar) => {
            debug!(instrument = %bar.instrument, period = %bar.period, "applying live bar")
        }
        Message::HistoricalBar(bar) => debug!(
            instrument = %bar.instrument,
            period = %bar.period,
            sequence = bar.sequence,
            "applying historical bar"
        ),
        Message::Account(info) => debug!(
            balance = %info.account.balance,
            equity = %info.account.equity,
            positions = info.positions.len(),
            "applying account info"
        ),
        Message::Tick(_) => {}
    }

    message.apply(&ctx.ledger);
    ctx.metrics.inc_applied(class);
    delivery.ack();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::CountingAcknowledger;
    use ledger::create_ledger;
    use metrics::create_metrics;
    use std::time::Duration;

    fn tick_body(n: i64, produced_at: i64) -> Vec<u8> {
        format!(
            r#"{{"produced_at":{produced_at},"timestamp":{n},"pairId":1,"instrument":"EURUSD","bid":1.1,"ask":1.1002,"bidVol":1,"askVol":1}}"#
        )
        .into_bytes()
    }

    fn delivery(tag: u64, queue: &str, body: Vec<u8>, acker: &Arc<CountingAcknowledger>) -> Delivery {
        Delivery::new(tag, queue, body, acker.clone())
    }

    async fn wait_until(mut cond: impl FnMut() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    #[tokio::test]
    async fn test_malformed_and_stale_are_not_applied() {
        let ledger = create_ledger();
        let metrics = create_metrics();
        let acker = Arc::new(CountingAcknowledger::new());
        let pipeline =
            IngestionPipeline::new(IngestConfig::default(), ledger.clone(), metrics.clone());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = pipeline.start(shutdown_rx);

        let now = common::timestamp_ms();
        let bodies = [b"not json".to_vec(), tick_body(1, now - 60_000), tick_body(2, now)];
        for (tag, body) in bodies.into_iter().enumerate() {
            let d = delivery(tag as u64, "Market_Data_Ticks", body, &acker);
            pipeline.enqueue(MessageClass::Tick, d).unwrap();
        }

        wait_until(|| acker.acked() + acker.rejected() == 3).await;

        assert_eq!(acker.rejected(), 1);
        assert_eq!(acker.acked(), 2);
        assert_eq!(metrics.malformed(MessageClass::Tick), 1);
        assert_eq!(metrics.stale(MessageClass::Tick), 1);
        assert_eq!(metrics.applied(MessageClass::Tick), 1);
        assert_eq!(ledger.ticks("EURUSD").len(), 1);

        shutdown_tx.send(true).unwrap();
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_unknown_queue_rejected() {
        let pipeline =
            IngestionPipeline::new(IngestConfig::default(), create_ledger(), create_metrics());
        let acker = Arc::new(CountingAcknowledger::new());

        let err = pipeline
            .enqueue_routed(delivery(1, "Somewhere_Else", b"{}".to_vec(), &acker))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnknownQueue(_)));
        assert_eq!(acker.rejected(), 1);
    }

    #[tokio::test]
    async fn test_start_twice_spawns_nothing_more() {
        let pipeline =
            IngestionPipeline::new(IngestConfig::default(), create_ledger(), create_metrics());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let first = pipeline.start(shutdown_rx.clone());
        assert_eq!(first.len(), 1 + 3 + 2 + 1);
        assert!(pipeline.start(shutdown_rx).is_empty());

        shutdown_tx.send(true).unwrap();
        for h in first {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_messages() {
        let ledger = create_ledger();
        let metrics = create_metrics();
        let acker = Arc::new(CountingAcknowledger::new());
        let pipeline = IngestionPipeline::new(IngestConfig::default(), ledger.clone(), metrics);
        let now = common::timestamp_ms();

        for n in 0..5 {
            let d = delivery(n as u64, "Market_Data_Ticks", tick_body(n, now), &acker);
            pipeline.enqueue(MessageClass::Tick, d).unwrap();
        }
        assert_eq!(pipeline.queue_len(MessageClass::Tick), 5);

        // Shutdown is already signalled when the workers start.
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);
        for h in pipeline.start(shutdown_rx) {
            h.await.unwrap();
        }

        assert_eq!(acker.acked(), 5);
        assert_eq!(ledger.ticks("EURUSD").len(), 5);
    }

    #[tokio::test]
    async fn test_enqueue_after_workers_exit_requeues() {
        let pipeline =
            IngestionPipeline::new(IngestConfig::default(), create_ledger(), create_metrics());
        let acker = Arc::new(CountingAcknowledger::new());
        let (_shutdown_tx, shutdown_rx) = watch::channel(true);
        for h in pipeline.start(shutdown_rx) {
            h.await.unwrap();
        }

        let err = pipeline
            .enqueue(MessageClass::Account, delivery(1, "Account_Info", b"{}".to_vec(), &acker))
            .unwrap_err();
        assert!(matches!(err, IngestError::Closed(MessageClass::Account)));
        assert_eq!(acker.requeued(), 1);
    }
}
