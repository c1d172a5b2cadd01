use model::HistoricalBar;
use rust_decimal::Decimal;
use strategy_core::indicators::{median_price, simple_atr};
use strategy_core::{param, Params, Signal, Strategy, StrategyError};

use super::to_decimal;

/// Trend entry on a close crossing back through a Supertrend band.
///
/// With both `atrLen` (> 1) and `mult` (> 0) set, bands are median price
/// +/- `mult` x simple ATR. Otherwise the producer's bid Supertrend is used.
#[derive(Debug, Default, Clone)]
pub struct Supertrend {
    atr_len: Option<usize>,
    mult: Option<Decimal>,
}

struct Bands {
    upper: Decimal,
    lower: Decimal,
}

impl Supertrend {
    pub const KEY: &'static str = "SUPERTREND_TREND";

    fn computed(bars: &[HistoricalBar], atr_len: usize, mult: Decimal) -> Option<(Bands, Bands)> {
        if bars.len() <= atr_len {
            return None;
        }
        let band = |bars: &[HistoricalBar]| {
            let mid = median_price(&bars[0].bid);
            let width = mult * simple_atr(bars, atr_len);
            Bands {
                upper: mid + width,
                lower: mid - width,
            }
        };
        Some((band(bars), band(&bars[1..])))
    }

    fn precomputed(bar: &HistoricalBar) -> Bands {
        Bands {
            upper: bar.bid_supertrend.upper.unwrap_or_default(),
            lower: bar.bid_supertrend.lower.unwrap_or_default(),
        }
    }
}

impl Strategy for Supertrend {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, bars: &[HistoricalBar]) -> Signal {
        if bars.len() < 2 {
            return Signal::None;
        }
        let (now, prev) = match (self.atr_len, self.mult) {
            (Some(atr_len), Some(mult)) => match Self::computed(bars, atr_len, mult) {
                Some(bands) => bands,
                None => return Signal::None,
            },
            _ => (Self::precomputed(&bars[0]), Self::precomputed(&bars[1])),
        };
        let (c0, c1) = (bars[0].bid.c, bars[1].bid.c);
        let zero = Decimal::ZERO;

        if prev.lower > zero && c1 <= prev.lower && now.lower > zero && c0 > now.lower {
            Signal::Buy
        } else if prev.upper > zero && c1 >= prev.upper && now.upper > zero && c0 < now.upper {
            Signal::Sell
        } else {
            Signal::None
        }
    }

    fn set_params(&mut self, params: &Params) -> Vec<StrategyError> {
        let mut rejected = Vec::new();
        match param(params, "atrLen", |v| (v as i64) > 1) {
            Ok(Some(v)) => self.atr_len = Some(v as usize),
            Ok(None) => {}
            Err(e) => rejected.push(e),
        }
        match param(params, "mult", |v| v > 0.0) {
            Ok(Some(v)) => self.mult = Some(to_decimal(v)),
            Ok(None) => {}
            Err(e) => rejected.push(e),
        }
        rejected
    }
}
