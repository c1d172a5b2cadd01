//! Fire-and-forget audit trail for strategy runs and orders.
//!
//! [`AuditSink::record`] never blocks and never fails from the caller's point
//! of view. A persistent store consumes events from a [`ChannelAuditSink`]
//! receiver; [`TracingAuditSink`] just logs them.

mod event;
mod sink;

pub use event::{AuditEvent, EntryIntent, OrderRecord, OrderSource, RunStatus};
pub use sink::{
    create_audit_channel, AuditReceiver, AuditSink, ChannelAuditSink, SharedAuditSink,
    TracingAuditSink,
};
