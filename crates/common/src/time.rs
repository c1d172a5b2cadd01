use chrono::{DateTime, Utc};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// `HHMMSS` of a millisecond timestamp, in UTC.
pub fn utc_hhmmss(ts_ms: i64) -> String {
    DateTime::from_timestamp_millis(ts_ms)
        .map(|t| t.format("%H%M%S").to_string())
        .unwrap_or_else(|| "000000".to_string())
}
