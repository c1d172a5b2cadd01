//! Concurrent ingestion of broker messages into the ledger.
//!
//! ```text
//!  transport ──enqueue──> [ticks 1000]      ──> 1 worker  ─┐
//!   (Delivery)            [live bars 100]   ──> 3 workers ─┤  parse → stale? → apply → ack
//!                         [historical 500]  ──> 2 workers ─┤           │
//!                         [account 10]      ──> 1 worker  ─┘       LedgerStore
//! ```
//!
//! Enqueue never blocks. When a queue is full the delivery is rejected
//! without requeue and counted as dropped. Malformed bodies are rejected
//! without requeue; ticks, live bars and account snapshots older than the
//! staleness threshold are acknowledged and discarded. Historical bars are
//! always merged.

mod config;
mod delivery;
mod error;
mod message;
mod pipeline;

pub use config::IngestConfig;
pub use delivery::{Acknowledger, CountingAcknowledger, Delivery};
pub use error::IngestError;
pub use message::Message;
pub use pipeline::IngestionPipeline;
