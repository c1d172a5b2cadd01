//! Stop-loss and take-profit placement.

use model::{HistoricalBar, OrderCmd};
use rust_decimal::Decimal;
use strategy_core::Signal;

/// Where a strategy order's protective levels go.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectionPlan {
    pub entry_mid: Decimal,
    pub pip_size: Decimal,
    /// Distance in pips, used for both stop and target.
    pub sl_pips: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
}

/// Stop distance in pips for a strategy entry on `bar`.
///
/// A positive `fixed_pips` wins. Otherwise `atr_mult` x ATR in pips, floored
/// at `min_pips`, or `default_pips` when the bar has no positive ATR.
pub fn stop_distance_pips(
    bar: &HistoricalBar,
    pip: Decimal,
    atr_mult: Decimal,
    fixed_pips: Option<Decimal>,
    default_pips: Decimal,
    min_pips: Decimal,
) -> Decimal {
    if let Some(fixed) = fixed_pips.filter(|p| *p > Decimal::ZERO) {
        return fixed;
    }
    match bar.atr() {
        Some(atr) if pip > Decimal::ZERO => (atr_mult * atr / pip).max(min_pips),
        _ => default_pips,
    }
}

/// Stop and target prices `sl_pips` / `tp_pips` away from `entry`.
///
/// Buys protect below and target above; sells are mirrored. Missing or
/// non-positive distances give `None`.
pub fn protective_prices(
    entry: Decimal,
    cmd: OrderCmd,
    pip: Decimal,
    sl_pips: Option<Decimal>,
    tp_pips: Option<Decimal>,
) -> (Option<Decimal>, Option<Decimal>) {
    let offset = |pips: Option<Decimal>| pips.filter(|p| *p > Decimal::ZERO).map(|p| p * pip);
    let (sl, tp) = (offset(sl_pips), offset(tp_pips));
    if cmd.is_buy() {
        (sl.map(|d| entry - d), tp.map(|d| entry + d))
    } else {
        (sl.map(|d| entry + d), tp.map(|d| entry - d))
    }
}

/// Symmetric stop and target around the newest bar's mid close.
///
/// Returns `None` for [`Signal::None`].
pub fn plan(
    bar: &HistoricalBar,
    signal: Signal,
    pip: Decimal,
    atr_mult: Decimal,
    fixed_pips: Option<Decimal>,
    default_pips: Decimal,
    min_pips: Decimal,
) -> Option<ProtectionPlan> {
    let cmd = signal.order_cmd()?;
    let sl_pips = stop_distance_pips(bar, pip, atr_mult, fixed_pips, default_pips, min_pips);
    let entry_mid = bar.mid_close();
    let (stop_loss, take_profit) =
        protective_prices(entry_mid, cmd, pip, Some(sl_pips), Some(sl_pips));

    Some(ProtectionPlan {
        entry_mid,
        pip_size: pip,
        sl_pips,
        stop_loss: stop_loss?,
        take_profit: take_profit?,
    })
}

/// `<INSTRUMENT>_strat_<buy|sell>_<HHMMSS>` in UTC.
pub fn order_label(instrument: &str, signal: Signal, ts_ms: i64) -> String {
    format!(
        "{}_strat_{}_{}",
        instrument,
        signal.as_str().to_ascii_lowercase(),
        common::utc_hhmmss(ts_ms)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Ohlcv;
    use rust_decimal_macros::dec;

    fn bar(atr: Option<Decimal>) -> HistoricalBar {
        let side = |c| Ohlcv {
            o: c,
            h: c,
            l: c,
            c,
            v: dec!(1),
        };
        HistoricalBar {
            bid: side(dec!(1.1000)),
            ask: side(dec!(1.1002)),
            bid_atr: atr,
            ..Default::default()
        }
    }

    #[test]
    fn test_atr_distance() {
        let p = plan(
            &bar(Some(dec!(0.0010))),
            Signal::Buy,
            dec!(0.0001),
            dec!(2.0),
            None,
            dec!(10),
            dec!(1),
        )
        .unwrap();
        assert_eq!(p.sl_pips, dec!(20));
        assert_eq!(p.entry_mid, dec!(1.1001));
        assert_eq!(p.stop_loss, dec!(1.0981));
        assert_eq!(p.take_profit, dec!(1.1021));
    }

    #[test]
    fn test_sell_is_mirrored() {
        let p = plan(
            &bar(Some(dec!(0.0010))),
            Signal::Sell,
            dec!(0.0001),
            dec!(1.0),
            None,
            dec!(10),
            dec!(1),
        )
        .unwrap();
        assert_eq!(p.stop_loss, dec!(1.1011));
        assert_eq!(p.take_profit, dec!(1.0991));
    }

    #[test]
    fn test_distance_fallbacks() {
        let pip = dec!(0.0001);
        // No ATR on either side.
        assert_eq!(stop_distance_pips(&bar(None), pip, dec!(2), None, dec!(10), dec!(1)), dec!(10));
        // Tiny ATR is floored.
        let tiny = bar(Some(dec!(0.00001)));
        assert_eq!(stop_distance_pips(&tiny, pip, dec!(1), None, dec!(10), dec!(1)), dec!(1));
        // Ask ATR used when bid ATR is not positive.
        let mut ask_only = bar(Some(Decimal::ZERO));
        ask_only.ask_atr = Some(dec!(0.0005));
        assert_eq!(stop_distance_pips(&ask_only, pip, dec!(1), None, dec!(10), dec!(1)), dec!(5));
        // Fixed distance wins.
        assert_eq!(
            stop_distance_pips(&tiny, pip, dec!(1), Some(dec!(15)), dec!(10), dec!(1)),
            dec!(15)
        );
    }

    #[test]
    fn test_no_plan_without_signal() {
        let none = plan(&bar(None), Signal::None, dec!(0.0001), dec!(1), None, dec!(10), dec!(1));
        assert!(none.is_none());
    }

    #[test]
    fn test_protective_prices_optional() {
        let (sl, tp) = protective_prices(dec!(150.00), OrderCmd::Sell, dec!(0.01), Some(dec!(20)), None);
        assert_eq!(sl, Some(dec!(150.20)));
        assert_eq!(tp, None);
    }

    #[test]
    fn test_label() {
        assert_eq!(
            order_label("EURUSD", Signal::Buy, 1_700_000_000_000),
            "EURUSD_strat_buy_221320"
        );
    }
}
