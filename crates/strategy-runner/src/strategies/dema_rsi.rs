use model::HistoricalBar;
use rust_decimal::Decimal;
use strategy_core::{Signal, Strategy};

/// DEMA 25/50 crossover confirmed by fast RSI.
///
/// Buys when DEMA25 crosses above DEMA50 between the previous and newest bar
/// with RSI above 50; sells on the opposite cross with RSI below 50.
#[derive(Debug, Default, Clone)]
pub struct DemaRsi;

impl DemaRsi {
    pub const KEY: &'static str = "DEMA_RSI";
    const MIN_BARS: usize = 3;
}

impl Strategy for DemaRsi {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn evaluate(&self, bars: &[HistoricalBar]) -> Signal {
        if bars.len() < Self::MIN_BARS {
            return Signal::None;
        }
        let (b0, b1) = (&bars[0], &bars[1]);
        let (Some(fast0), Some(slow0), Some(fast1), Some(slow1), Some(rsi)) = (
            b0.bid_demas.dema_25,
            b0.bid_demas.dema_50,
            b1.bid_demas.dema_25,
            b1.bid_demas.dema_50,
            b0.bid_rsi.fast,
        ) else {
            return Signal::None;
        };

        let fifty = Decimal::from(50);
        if fast1 <= slow1 && fast0 > slow0 && rsi > fifty {
            Signal::Buy
        } else if fast1 >= slow1 && fast0 < slow0 && rsi < fifty {
            Signal::Sell
        } else {
            Signal::None
        }
    }
}
