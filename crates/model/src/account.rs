use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Account-level balances.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    pub account_id: String,
    pub balance: Decimal,
    pub equity: Decimal,
    pub margin_used: Decimal,
    pub free_margin: Decimal,
    pub margin_available: Decimal,
    pub leverage: Decimal,
    #[serde(rename = "accountPnL")]
    pub account_pnl: Decimal,
    #[serde(rename = "unrealizedPnL")]
    pub unrealized_pnl: Decimal,
}

/// One open position as reported by the venue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub order_id: String,
    pub label: String,
    pub instrument: String,
    /// `BUY` or `SELL`.
    pub order_command: String,
    pub amount: Decimal,
    pub open_price: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub pnl: Decimal,
    pub state: String,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.order_command.eq_ignore_ascii_case("BUY")
    }
}

/// Full account snapshot. Replaces the previous one wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub produced_at: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub account: Account,
    #[serde(default)]
    pub positions: Vec<Position>,
}
