use std::fmt;

use model::OrderCmd;
use serde::{Deserialize, Serialize};

/// Outcome of one strategy evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    #[default]
    None,
    Buy,
    Sell,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::None => "NONE",
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::None)
    }

    /// Market order side for the signal.
    pub fn order_cmd(&self) -> Option<OrderCmd> {
        match self {
            Signal::None => None,
            Signal::Buy => Some(OrderCmd::Buy),
            Signal::Sell => Some(OrderCmd::Sell),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_mapping() {
        assert_eq!(Signal::None.order_cmd(), None);
        assert_eq!(Signal::Buy.order_cmd(), Some(OrderCmd::Buy));
        assert_eq!(Signal::Sell.order_cmd(), Some(OrderCmd::Sell));
        assert!(!Signal::default().is_actionable());
        assert_eq!(Signal::Sell.to_string(), "SELL");
    }

    #[test]
    fn test_signal_serde() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        let parsed: Signal = serde_json::from_str("\"NONE\"").unwrap();
        assert_eq!(parsed, Signal::None);
    }
}
