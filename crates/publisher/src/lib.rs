//! Outbound message boundary.
//!
//! The core publishes two kinds of message:
//!
//! - backfill requests, plain text on `<INSTRUMENT>_H-Requests`
//! - trade commands, JSON on `Trade_Commands`
//!
//! [`Publisher`] is the seam to the transport. [`DryRunPublisher`] only logs;
//! [`ChannelPublisher`] hands encoded messages to an mpsc receiver, which is
//! where a broker client plugs in.

mod channel;
mod dry_run;
mod error;

use std::sync::Arc;

use async_trait::async_trait;
use model::{BackfillRequest, TradeCommand, TRADE_COMMANDS_QUEUE};

pub use channel::{create_outbound_channel, ChannelPublisher, OutboundReceiver};
pub use dry_run::DryRunPublisher;
pub use error::PublishError;

/// An encoded message ready for the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub queue: String,
    pub content_type: &'static str,
    pub body: String,
}

impl OutboundMessage {
    pub fn backfill(request: &BackfillRequest) -> Self {
        Self {
            queue: request.queue(),
            content_type: "text/plain",
            body: request.body(),
        }
    }

    pub fn trade_command(command: &TradeCommand) -> Result<Self, PublishError> {
        Ok(Self {
            queue: TRADE_COMMANDS_QUEUE.to_string(),
            content_type: "application/json",
            body: serde_json::to_string(command)?,
        })
    }

    /// Decode the body back into a trade command, if this is one.
    pub fn as_trade_command(&self) -> Option<TradeCommand> {
        if self.queue != TRADE_COMMANDS_QUEUE {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }
}

/// Outbound transport used by reconciliation, strategies and manual commands.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Ask the historical responder for `bars_count` bars of every period.
    async fn request_historical_bars(&self, request: BackfillRequest)
        -> Result<(), PublishError>;

    /// Send a trade command to the execution venue.
    async fn publish_trade_command(&self, command: TradeCommand) -> Result<(), PublishError>;
}

/// Shared handle to a publisher.
pub type SharedPublisher = Arc<dyn Publisher>;
