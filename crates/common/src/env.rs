//! Environment variable lookups with fallbacks.
//!
//! Missing or unparsable values fall back to the supplied default.

use std::str::FromStr;

/// Read `key` and parse it, returning `default` when unset or invalid.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(key, value = %raw, "invalid environment value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Read a comma-separated list. Entries are trimmed and upper-cased; empty
/// entries are skipped. Returns `None` when the variable is unset or empty.
pub fn env_list(key: &str) -> Option<Vec<String>> {
    let raw = std::env::var(key).ok()?;
    let items = parse_list(&raw);
    (!items.is_empty()).then_some(items)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}
