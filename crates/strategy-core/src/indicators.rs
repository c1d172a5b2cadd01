//! Indicator helpers over newest-first bar series.
//!
//! All helpers read the bid side.

use model::{HistoricalBar, Ohlcv};
use rust_decimal::Decimal;

/// Largest of the bar range and the gaps to the previous close.
pub fn true_range(bar: &Ohlcv, prev_close: Decimal) -> Decimal {
    (bar.h - bar.l)
        .max((bar.h - prev_close).abs())
        .max((bar.l - prev_close).abs())
}

/// Mean true range over the `n` newest bars.
///
/// Needs one bar beyond the window for the previous close; returns zero
/// otherwise.
pub fn simple_atr(bars: &[HistoricalBar], n: usize) -> Decimal {
    if n == 0 || bars.len() <= n {
        return Decimal::ZERO;
    }
    let sum: Decimal = bars
        .windows(2)
        .take(n)
        .map(|w| true_range(&w[0].bid, w[1].bid.c))
        .sum();
    sum / Decimal::from(n as u64)
}

/// Highest high and lowest low of the `len` newest bars.
pub fn channel(bars: &[HistoricalBar], len: usize) -> Option<(Decimal, Decimal)> {
    let window = bars.get(..len)?;
    let first = window.first()?;
    Some(
        window
            .iter()
            .fold((first.bid.h, first.bid.l), |(hi, lo), b| {
                (hi.max(b.bid.h), lo.min(b.bid.l))
            }),
    )
}

/// Midpoint of the bar's high and low.
pub fn median_price(bar: &Ohlcv) -> Decimal {
    (bar.h + bar.l) / Decimal::TWO
}
