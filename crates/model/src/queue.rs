use std::fmt;

/// Inbound message class. Each class has its own queue and worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageClass {
    Tick,
    LiveBar,
    HistoricalBar,
    Account,
}

const LIVE_BARS_PREFIX: &str = "Market_Data_Bars_";

impl MessageClass {
    pub const ALL: [MessageClass; 4] = [
        MessageClass::Tick,
        MessageClass::LiveBar,
        MessageClass::HistoricalBar,
        MessageClass::Account,
    ];

    /// Route a broker queue name to its message class.
    ///
    /// Live bars arrive on one queue per instrument
    /// (`Market_Data_Bars_EURUSD`, ...).
    pub fn from_queue(queue: &str) -> Option<Self> {
        match queue {
            "Market_Data_Ticks" => Some(Self::Tick),
            "H-Bars" => Some(Self::HistoricalBar),
            "Account_Info" => Some(Self::Account),
            q if q.len() > LIVE_BARS_PREFIX.len() && q.starts_with(LIVE_BARS_PREFIX) => {
                Some(Self::LiveBar)
            }
            _ => None,
        }
    }

    /// Stable index, usable for per-class arrays.
    pub fn index(&self) -> usize {
        match self {
            Self::Tick => 0,
            Self::LiveBar => 1,
            Self::HistoricalBar => 2,
            Self::Account => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tick => "tick",
            Self::LiveBar => "live_bar",
            Self::HistoricalBar => "historical_bar",
            Self::Account => "account",
        }
    }
}

impl fmt::Display for MessageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
