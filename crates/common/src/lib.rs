//! Process-wide helpers: logging bootstrap, wall-clock time and environment
//! lookups.

mod env;
mod logging;
mod time;

pub use env::{env_list, env_or};
pub use logging::init_logging;
pub use time::{timestamp_ms, utc_hhmmss};
