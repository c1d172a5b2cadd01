use model::MessageClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Queue at capacity; the delivery was rejected without requeue.
    #[error("{0} queue full")]
    QueueFull(MessageClass),

    /// Pipeline stopped; the delivery was rejected with requeue.
    #[error("{0} queue closed")]
    Closed(MessageClass),

    #[error("no message class for queue {0}")]
    UnknownQueue(String),

    #[error("malformed {class} message: {reason}")]
    Malformed { class: MessageClass, reason: String },
}
