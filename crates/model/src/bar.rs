//! Live and historical bar shapes.
//!
//! Indicator values are optional: producers send `null` while an indicator is
//! warming up, and older producers omit fields entirely.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Period;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ohlcv {
    pub o: Decimal,
    pub h: Decimal,
    pub l: Decimal,
    pub c: Decimal,
    pub v: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vwap {
    pub tick_vwap: Option<Decimal>,
    pub bar_vwap: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Emas {
    pub ema_5: Option<Decimal>,
    pub ema_8: Option<Decimal>,
    pub ema_30: Option<Decimal>,
    pub ema_50: Option<Decimal>,
}

/// Upper/middle/lower channel (Donchian, Bollinger, Keltner).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Band {
    pub upper: Option<Decimal>,
    pub middle: Option<Decimal>,
    pub lower: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Demas {
    pub dema_25: Option<Decimal>,
    pub dema_50: Option<Decimal>,
    pub dema_100: Option<Decimal>,
    pub dema_200: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Macd {
    pub line: Option<Decimal>,
    pub signal: Option<Decimal>,
    pub hist: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rsi {
    pub fast: Option<Decimal>,
    pub slow: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stoch {
    pub k: Option<Decimal>,
    pub d: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Supertrend {
    pub upper: Option<Decimal>,
    pub lower: Option<Decimal>,
}

/// Most recently closed bar of the real-time feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub produced_at: i64,
    #[serde(default)]
    pub bar_start_timestamp: i64,
    pub bar_end_timestamp: i64,
    #[serde(rename = "pairId", default)]
    pub pair_id: i64,
    pub instrument: String,
    pub period: Period,
    pub bid: Ohlcv,
    pub ask: Ohlcv,
    #[serde(default)]
    pub vwap: Vwap,
    #[serde(default)]
    pub emas: Emas,
    #[serde(default)]
    pub donchian: Band,
    #[serde(default)]
    pub bollinger: Band,
}

/// Bar from a bulk historical response, with per-side indicators.
///
/// This is also the shape of every entry in the canonical series; live bars
/// are converted with [`HistoricalBar::from`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub produced_at: i64,
    #[serde(default)]
    pub bar_start_timestamp: i64,
    pub bar_end_timestamp: i64,
    #[serde(rename = "pairId", default)]
    pub pair_id: i64,
    pub instrument: String,
    pub period: Period,
    /// Position in the producer's response batch. Zero for bars that came
    /// from the live feed.
    #[serde(default)]
    pub sequence: i64,
    pub bid: Ohlcv,
    pub ask: Ohlcv,

    #[serde(default)]
    pub bid_vwap: Vwap,
    #[serde(default)]
    pub bid_atr: Option<Decimal>,
    #[serde(default)]
    pub bid_obv: Option<Decimal>,
    #[serde(default)]
    pub bid_demas: Demas,
    #[serde(default)]
    pub bid_macd: Macd,
    #[serde(default)]
    pub bid_rsi: Rsi,
    #[serde(default)]
    pub bid_stoch: Stoch,
    #[serde(default)]
    pub bid_cci: Option<Decimal>,
    #[serde(default)]
    pub bid_mfi: Option<Decimal>,
    #[serde(default)]
    pub bid_bollinger: Band,
    #[serde(default)]
    pub bid_keltner: Band,
    #[serde(default)]
    pub bid_donchian: Band,
    #[serde(default)]
    pub bid_supertrend: Supertrend,

    #[serde(default)]
    pub ask_vwap: Vwap,
    #[serde(default)]
    pub ask_atr: Option<Decimal>,
    #[serde(default)]
    pub ask_obv: Option<Decimal>,
    #[serde(default)]
    pub ask_demas: Demas,
    #[serde(default)]
    pub ask_macd: Macd,
    #[serde(default)]
    pub ask_rsi: Rsi,
    #[serde(default)]
    pub ask_stoch: Stoch,
    #[serde(default)]
    pub ask_cci: Option<Decimal>,
    #[serde(default)]
    pub ask_mfi: Option<Decimal>,
    #[serde(default)]
    pub ask_bollinger: Band,
    #[serde(default)]
    pub ask_keltner: Band,
    #[serde(default)]
    pub ask_donchian: Band,
    #[serde(default)]
    pub ask_supertrend: Supertrend,
}

impl HistoricalBar {
    /// Bid-side ATR, falling back to the ask side. Non-positive values count
    /// as missing.
    pub fn atr(&self) -> Option<Decimal> {
        self.bid_atr
            .filter(|v| v.is_sign_positive() && !v.is_zero())
            .or_else(|| self.ask_atr.filter(|v| v.is_sign_positive() && !v.is_zero()))
    }

    pub fn mid_close(&self) -> Decimal {
        (self.bid.c + self.ask.c) / Decimal::TWO
    }
}

impl From<&Bar> for HistoricalBar {
    fn from(bar: &Bar) -> Self {
        Self {
            produced_at: bar.produced_at,
            bar_start_timestamp: bar.bar_start_timestamp,
            bar_end_timestamp: bar.bar_end_timestamp,
            pair_id: bar.pair_id,
            instrument: bar.instrument.clone(),
            period: bar.period,
            sequence: 0,
            bid: bar.bid.clone(),
            ask: bar.ask.clone(),
            bid_vwap: bar.vwap.clone(),
            bid_donchian: bar.donchian.clone(),
            bid_bollinger: bar.bollinger.clone(),
            ..Default::default()
        }
    }
}
