//! Control surface of the trading core.
//!
//! Commands arrive as JSON objects tagged by `type`. Strategy commands go to
//! the scheduler, manual orders and closes are published directly, and
//! backfill requests go through the reconciler so its cooldown sees them.
//! A failed command is logged and reported back; it never affects the rest of
//! the core.

mod command;
mod error;
mod handler;

pub use command::{ControlCommand, Side};
pub use error::ControlError;
pub use handler::{ControlHandler, ControlReply};
