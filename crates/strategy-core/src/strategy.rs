//! Strategy trait definition.

use std::collections::HashMap;

use model::HistoricalBar;

use crate::error::StrategyError;
use crate::signal::Signal;

/// Free-form numeric parameters supplied when a run is started.
pub type Params = HashMap<String, f64>;

/// A trading decision over a bar series.
///
/// `bars` is the canonical series of one instrument and period, newest
/// first. `evaluate` must be a pure function of the series and the
/// parameters applied before the run started; strategies that lack enough
/// history or indicator values return [`Signal::None`].
pub trait Strategy: Send + Sync {
    /// Registry key, e.g. `DEMA_RSI`.
    fn key(&self) -> &'static str;

    fn evaluate(&self, bars: &[HistoricalBar]) -> Signal;

    /// Apply run parameters.
    ///
    /// Unknown keys are ignored. Recognised keys with out-of-range values
    /// are ignored too and reported back so the caller can log them.
    fn set_params(&mut self, _params: &Params) -> Vec<StrategyError> {
        Vec::new()
    }
}

/// A boxed strategy trait object.
pub type BoxedStrategy = Box<dyn Strategy>;

/// Look up `key` and check it with `valid`.
///
/// `Ok(None)` when absent, `Err` when present but rejected.
pub fn param(
    params: &Params,
    key: &str,
    valid: impl Fn(f64) -> bool,
) -> Result<Option<f64>, StrategyError> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_finite() && valid(*v) => Ok(Some(*v)),
        Some(v) => Err(StrategyError::InvalidParam {
            key: key.to_string(),
            value: *v,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_lookup() {
        let params: Params = [("len".to_string(), 20.0), ("buf".to_string(), -1.0)]
            .into_iter()
            .collect();

        assert_eq!(param(&params, "len", |v| v > 1.0), Ok(Some(20.0)));
        assert_eq!(param(&params, "missing", |v| v > 1.0), Ok(None));
        assert_eq!(
            param(&params, "buf", |v| v >= 0.0),
            Err(StrategyError::InvalidParam {
                key: "buf".into(),
                value: -1.0
            })
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let params: Params = [("mult".to_string(), f64::NAN)].into_iter().collect();
        assert!(param(&params, "mult", |_| true).is_err());
    }
}
