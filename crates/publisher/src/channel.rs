use async_trait::async_trait;
use model::{BackfillRequest, TradeCommand};
use tokio::sync::mpsc;
use tracing::debug;

use crate::{OutboundMessage, PublishError, Publisher};

pub type OutboundReceiver = mpsc::Receiver<OutboundMessage>;

/// Publisher that forwards encoded messages over a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPublisher {
    tx: mpsc::Sender<OutboundMessage>,
}

pub fn create_outbound_channel(capacity: usize) -> (ChannelPublisher, OutboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelPublisher { tx }, rx)
}

impl ChannelPublisher {
    async fn send(&self, msg: OutboundMessage) -> Result<(), PublishError> {
        debug!(queue = %msg.queue, "publishing");
        self.tx
            .send(msg)
            .await
            .map_err(|_| PublishError::ChannelClosed)
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn request_historical_bars(
        &self,
        request: BackfillRequest,
    ) -> Result<(), PublishError> {
        self.send(OutboundMessage::backfill(&request)).await
    }

    async fn publish_trade_command(&self, command: TradeCommand) -> Result<(), PublishError> {
        self.send(OutboundMessage::trade_command(&command)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_forwards_messages() {
        let (publisher, mut rx) = create_outbound_channel(4);
        publisher
            .request_historical_bars(BackfillRequest::new("GBPUSD", 150))
            .await
            .unwrap();

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.queue, "GBPUSD_H-Requests");
        assert_eq!(msg.body, "instrument:GBPUSD,barsCount:150");
    }

    #[tokio::test]
    async fn test_closed_receiver_is_error() {
        let (publisher, rx) = create_outbound_channel(1);
        drop(rx);
        let err = publisher
            .publish_trade_command(TradeCommand::close("9"))
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::ChannelClosed));
    }
}
