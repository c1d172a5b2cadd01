//! Bar timeframes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Bar timeframe. Serialized as `TEN_SECS`, `ONE_MIN`, ... on the wire.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Period {
    TenSecs,
    #[default]
    OneMin,
    FiveMins,
    FifteenMins,
    OneHour,
    FourHours,
    Daily,
}

impl Period {
    /// Every supported period, shortest first.
    pub const ALL: [Period; 7] = [
        Period::TenSecs,
        Period::OneMin,
        Period::FiveMins,
        Period::FifteenMins,
        Period::OneHour,
        Period::FourHours,
        Period::Daily,
    ];

    /// Wire name of the period.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TenSecs => "TEN_SECS",
            Self::OneMin => "ONE_MIN",
            Self::FiveMins => "FIVE_MINS",
            Self::FifteenMins => "FIFTEEN_MINS",
            Self::OneHour => "ONE_HOUR",
            Self::FourHours => "FOUR_HOURS",
            Self::Daily => "DAILY",
        }
    }

    /// Bar length in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        match self {
            Self::TenSecs => 10_000,
            Self::OneMin => 60_000,
            Self::FiveMins => 300_000,
            Self::FifteenMins => 900_000,
            Self::OneHour => 3_600_000,
            Self::FourHours => 14_400_000,
            Self::Daily => 86_400_000,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParsePeriodError(s.to_string()))
    }
}

/// Error parsing a period string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown period: {0}")]
pub struct ParsePeriodError(String);
