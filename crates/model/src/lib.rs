//! Market data, account and command types shared across the trading core.
//!
//! All prices and indicator values are [`Decimal`]. Inbound JSON numbers are
//! parsed exactly; outbound commands serialize them as JSON floats.

mod account;
mod bar;
mod command;
mod period;
mod queue;
mod tick;

pub use account::{Account, AccountInfo, Position};
pub use bar::{Band, Bar, Demas, Emas, HistoricalBar, Macd, Ohlcv, Rsi, Stoch, Supertrend, Vwap};
pub use command::{
    BackfillRequest, CommandKind, OrderCmd, TradeCommand, TRADE_COMMANDS_QUEUE,
};
pub use period::{ParsePeriodError, Period};
pub use queue::MessageClass;
pub use tick::Tick;

use rust_decimal::Decimal;

/// Instruments traded when no explicit list is configured.
pub const DEFAULT_INSTRUMENTS: [&str; 10] = [
    "EURUSD", "GBPUSD", "USDJPY", "USDCHF", "AUDUSD", "USDCAD", "NZDUSD", "EURJPY", "GBPJPY",
    "EURGBP",
];

/// Pip size for an instrument: 0.01 for JPY crosses, 0.0001 otherwise.
pub fn pip_size(instrument: &str) -> Decimal {
    if instrument.to_uppercase().contains("JPY") {
        Decimal::new(1, 2)
    } else {
        Decimal::new(1, 4)
    }
}
