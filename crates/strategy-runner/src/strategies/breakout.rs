use model::HistoricalBar;
use rust_decimal::Decimal;
use strategy_core::indicators::{channel, simple_atr};
use strategy_core::{param, Params, Signal, Strategy, StrategyError};

use super::to_decimal;

/// Donchian channel breakout.
///
/// Params:
/// - `len` (> 1): channel lookback. Without it the producer's bid Donchian
///   bands are used.
/// - `buf` (>= 0): widen the channel by `buf` x ATR before testing the close.
/// - `atrLen` (> 1): window of the fallback ATR when the bar carries none.
#[derive(Debug, Default, Clone)]
pub struct DonchianBreakout {
    len: Option<usize>,
    buf: Decimal,
    atr_len: Option<usize>,
}

impl DonchianBreakout {
    pub const KEY: &'static str = "BREAKOUT_DC";
    const DEFAULT_ATR_LEN: usize = 14;

    fn bands(&self, bars: &[HistoricalBar]) -> (Decimal, Decimal) {
        if let Some((upper, lower)) = self.len.and_then(|len| channel(bars, len)) {
            return (upper, lower);
        }
        let b0 = &bars[0];
        (
            b0.bid_donchian.upper.unwrap_or_default(),
            b0.bid_donchian.lower.unwrap_or_default(),
        )
    }

    fn buffer_atr(&self, bars: &[HistoricalBar]) -> Decimal {
        bars[0].atr().unwrap_or_else(|| {
            simple_atr(bars, self.atr_len.unwrap_or(Self::DEFAULT_ATR_LEN))
        })
    }
}

impl Strategy for DonchianBreakout {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, bars: &[HistoricalBar]) -> Signal {
        if bars.len() < 2 {
            return Signal::None;
        }
        let close = bars[0].bid.c;
        let (mut upper, mut lower) = self.bands(bars);
        if upper.is_zero() && lower.is_zero() {
            return Signal::None;
        }

        if self.buf > Decimal::ZERO {
            let pad = self.buf * self.buffer_atr(bars);
            upper += pad;
            lower -= pad;
        }

        if upper > Decimal::ZERO && close > upper {
            Signal::Buy
        } else if lower > Decimal::ZERO && close < lower {
            Signal::Sell
        } else {
            Signal::None
        }
    }

    fn set_params(&mut self, params: &Params) -> Vec<StrategyError> {
        let mut rejected = Vec::new();
        match param(params, "len", |v| (v as i64) > 1) {
            Ok(Some(v)) => self.len = Some(v as usize),
            Ok(None) => {}
            Err(e) => rejected.push(e),
        }
        match param(params, "buf", |v| v >= 0.0) {
            Ok(Some(v)) => self.buf = to_decimal(v),
            Ok(None) => {}
            Err(e) => rejected.push(e),
        }
        match param(params, "atrLen", |v| (v as i64) > 1) {
            Ok(Some(v)) => self.atr_len = Some(v as usize),
            Ok(None) => {}
            Err(e) => rejected.push(e),
        }
        rejected
    }
}
