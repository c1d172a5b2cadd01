//! Strategy scheduler error types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// Start or stop without an instrument.
    #[error("missing instrument")]
    MissingInstrument,
}
