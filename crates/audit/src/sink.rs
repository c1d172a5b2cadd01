use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{info, warn};

use crate::AuditEvent;

/// Destination for audit events. Implementations must not block.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

pub type SharedAuditSink = Arc<dyn AuditSink>;

/// Writes each event to the log as JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => info!(kind = event.kind(), event = %json, "audit"),
            Err(e) => warn!(kind = event.kind(), error = %e, "audit event not serializable"),
        }
    }
}

pub type AuditReceiver = mpsc::Receiver<AuditEvent>;

/// Hands events to a consumer over a bounded channel. When the channel is
/// full or closed the event is dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::Sender<AuditEvent>,
}

pub fn create_audit_channel(capacity: usize) -> (ChannelAuditSink, AuditReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ChannelAuditSink { tx }, rx)
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(kind = event.kind(), "audit channel full, dropping event")
            }
            Err(TrySendError::Closed(event)) => {
                warn!(kind = event.kind(), "audit channel closed, dropping event")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RunStatus;

    fn stopped(run_id: &str) -> AuditEvent {
        AuditEvent::RunStopped {
            ts: 1,
            run_id: run_id.to_string(),
            status: RunStatus::Stopped,
        }
    }

    #[test]
    fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = create_audit_channel(1);
        sink.record(stopped("a"));
        sink.record(stopped("b"));

        assert_eq!(rx.try_recv().unwrap().run_id(), Some("a"));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_closed_receiver() {
        let (sink, rx) = create_audit_channel(1);
        drop(rx);
        sink.record(stopped("a"));
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(stopped("r1")).unwrap();
        assert_eq!(json["eventType"], "run_stopped");
        assert_eq!(json["runId"], "r1");
        assert_eq!(json["status"], "stopped");

        TracingAuditSink.record(stopped("r1"));
    }
}
