//! Inbound deliveries and how their outcome is reported to the transport.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Reports the fate of a delivery back to the transport.
pub trait Acknowledger: Send + Sync {
    /// The message was handled (applied or deliberately discarded).
    fn ack(&self, delivery_tag: u64);

    /// The message was refused. With `requeue` the broker may redeliver it.
    fn reject(&self, delivery_tag: u64, requeue: bool);
}

/// One message received from the broker.
pub struct Delivery {
    pub delivery_tag: u64,
    /// Queue the message was consumed from.
    pub routing_key: String,
    pub body: Vec<u8>,
    acker: Arc<dyn Acknowledger>,
}

impl Delivery {
    pub fn new(
        delivery_tag: u64,
        routing_key: impl Into<String>,
        body: impl Into<Vec<u8>>,
        acker: Arc<dyn Acknowledger>,
    ) -> Self {
        Self {
            delivery_tag,
            routing_key: routing_key.into(),
            body: body.into(),
            acker,
        }
    }

    pub fn ack(self) {
        self.acker.ack(self.delivery_tag);
    }

    pub fn reject(self, requeue: bool) {
        self.acker.reject(self.delivery_tag, requeue);
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("delivery_tag", &self.delivery_tag)
            .field("routing_key", &self.routing_key)
            .field("body_len", &self.body.len())
            .finish()
    }
}

/// Acknowledger that only counts outcomes.
///
/// Used when the transport has no acknowledgement of its own, such as a
/// replayed feed.
#[derive(Debug, Default)]
pub struct CountingAcknowledger {
    acked: AtomicU64,
    rejected: AtomicU64,
    requeued: AtomicU64,
}

impl CountingAcknowledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acked(&self) -> u64 {
        self.acked.load(Ordering::Relaxed)
    }

    /// Rejections without requeue.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn requeued(&self) -> u64 {
        self.requeued.load(Ordering::Relaxed)
    }
}

impl Acknowledger for CountingAcknowledger {
    fn ack(&self, _delivery_tag: u64) {
        self.acked.fetch_add(1, Ordering::Relaxed);
    }

    fn reject(&self, _delivery_tag: u64, requeue: bool) {
        if requeue {
            self.requeued.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_acknowledger() {
        let acker = Arc::new(CountingAcknowledger::new());
        Delivery::new(1, "Market_Data_Ticks", b"{}".to_vec(), acker.clone()).ack();
        Delivery::new(2, "Market_Data_Ticks", b"{}".to_vec(), acker.clone()).reject(false);
        Delivery::new(3, "Market_Data_Ticks", b"{}".to_vec(), acker.clone()).reject(true);

        assert_eq!(acker.acked(), 1);
        assert_eq!(acker.rejected(), 1);
        assert_eq!(acker.requeued(), 1);
    }
}
