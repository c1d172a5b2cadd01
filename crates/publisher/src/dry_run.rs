//! Publisher that logs instead of sending.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use model::{BackfillRequest, TradeCommand};
use tracing::info;

use crate::{OutboundMessage, PublishError, Publisher};

/// Logs every outbound message and counts them.
#[derive(Debug, Default)]
pub struct DryRunPublisher {
    published: AtomicU64,
}

impl DryRunPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of messages that would have been sent.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    async fn request_historical_bars(
        &self,
        request: BackfillRequest,
    ) -> Result<(), PublishError> {
        let msg = OutboundMessage::backfill(&request);
        self.published.fetch_add(1, Ordering::Relaxed);
        info!(queue = %msg.queue, body = %msg.body, "[DRY RUN] would request historical bars");
        Ok(())
    }

    async fn publish_trade_command(&self, command: TradeCommand) -> Result<(), PublishError> {
        let msg = OutboundMessage::trade_command(&command)?;
        self.published.fetch_add(1, Ordering::Relaxed);
        info!(
            queue = %msg.queue,
            label = %command.label,
            instrument = %command.instrument,
            body = %msg.body,
            "[DRY RUN] would publish trade command"
        );
        Ok(())
    }
}
