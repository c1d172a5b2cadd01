//! Outbound commands: trade commands for the execution venue and backfill
//! requests for the historical responder.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Queue that carries [`TradeCommand`]s.
pub const TRADE_COMMANDS_QUEUE: &str = "Trade_Commands";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    SubmitOrder,
    CloseOrder,
    ModifyOrder,
}

/// Venue order command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderCmd {
    Buy,
    Sell,
    BuyLimit,
    SellLimit,
    BuyStop,
    SellStop,
}

impl OrderCmd {
    pub fn is_buy(&self) -> bool {
        matches!(self, Self::Buy | Self::BuyLimit | Self::BuyStop)
    }
}

impl fmt::Display for OrderCmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::BuyLimit => "BUY_LIMIT",
            Self::SellLimit => "SELL_LIMIT",
            Self::BuyStop => "BUY_STOP",
            Self::SellStop => "SELL_STOP",
        };
        f.write_str(s)
    }
}

/// Generic trade command. Empty and absent fields are left out of the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeCommand {
    pub command: CommandKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub instrument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_cmd: Option<OrderCmd>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Allowed slippage in pips.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_loss_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub take_profit_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub order_id: String,
}

impl TradeCommand {
    /// New `SUBMIT_ORDER` command. Protective prices and slippage are set with
    /// the builder methods.
    pub fn submit(
        label: impl Into<String>,
        instrument: impl Into<String>,
        order_cmd: OrderCmd,
        amount: Decimal,
    ) -> Self {
        Self {
            command: CommandKind::SubmitOrder,
            label: label.into(),
            instrument: instrument.into(),
            order_cmd: Some(order_cmd),
            amount: Some(amount),
            price: None,
            slippage: None,
            stop_loss_price: None,
            take_profit_price: None,
            order_id: String::new(),
        }
    }

    /// New `CLOSE_ORDER` command for a venue order id.
    pub fn close(order_id: impl Into<String>) -> Self {
        Self {
            command: CommandKind::CloseOrder,
            label: String::new(),
            instrument: String::new(),
            order_cmd: None,
            amount: None,
            price: None,
            slippage: None,
            stop_loss_price: None,
            take_profit_price: None,
            order_id: order_id.into(),
        }
    }

    /// New `MODIFY_ORDER` command. Non-positive prices are left unset.
    pub fn modify(order_id: impl Into<String>, stop_loss: Decimal, take_profit: Decimal) -> Self {
        let mut cmd = Self::close(order_id);
        cmd.command = CommandKind::ModifyOrder;
        cmd.stop_loss_price = positive(stop_loss);
        cmd.take_profit_price = positive(take_profit);
        cmd
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = positive(price);
        self
    }

    pub fn with_slippage(mut self, pips: Decimal) -> Self {
        self.slippage = positive(pips);
        self
    }

    pub fn with_stop_loss(mut self, price: Decimal) -> Self {
        self.stop_loss_price = positive(price);
        self
    }

    pub fn with_take_profit(mut self, price: Decimal) -> Self {
        self.take_profit_price = positive(price);
        self
    }
}

fn positive(value: Decimal) -> Option<Decimal> {
    (value > Decimal::ZERO).then_some(value)
}

/// Request for a bulk historical response covering every period of an
/// instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillRequest {
    pub instrument: String,
    pub bars_count: usize,
}

impl BackfillRequest {
    pub fn new(instrument: impl Into<String>, bars_count: usize) -> Self {
        Self {
            instrument: instrument.into(),
            bars_count,
        }
    }

    /// Per-instrument request queue, e.g. `EURUSD_H-Requests`.
    pub fn queue(&self) -> String {
        format!("{}_H-Requests", self.instrument)
    }

    /// Plain-text body understood by the historical responder.
    ///
    /// The responder splits on `,` and `:` without a JSON parser, so the
    /// body carries no braces or quotes.
    pub fn body(&self) -> String {
        format!(
            "instrument:{},barsCount:{}",
            self.instrument, self.bars_count
        )
    }
}
