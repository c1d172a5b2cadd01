//! Canonical historical series maintenance.
//!
//! A series is newest-first by `bar_end_timestamp`, unique by that timestamp
//! and bounded. Every function here leaves the series in that shape.

use model::HistoricalBar;

/// Merge a bar that came from the live feed.
///
/// A bar with an existing close time replaces that entry in place. A new one
/// is inserted at its ordered position, which is the front for the usual case
/// of the newest closed bar.
pub(crate) fn merge_live(series: &mut Vec<HistoricalBar>, bar: HistoricalBar, capacity: usize) {
    if let Some(slot) = series
        .iter_mut()
        .find(|b| b.bar_end_timestamp == bar.bar_end_timestamp)
    {
        *slot = bar;
        return;
    }

    let idx = series.partition_point(|b| b.bar_end_timestamp > bar.bar_end_timestamp);
    series.insert(idx, bar);
    normalize(series, capacity);
}

/// Merge a bar from a bulk historical response.
///
/// Identity is the close time; an equal non-zero `sequence` also counts as
/// the same bar, which lets a producer resend a corrected batch.
pub(crate) fn merge_historical(
    series: &mut Vec<HistoricalBar>,
    bar: HistoricalBar,
    capacity: usize,
) {
    let existing = series
        .iter()
        .position(|b| b.bar_end_timestamp == bar.bar_end_timestamp)
        .or_else(|| {
            (bar.sequence != 0)
                .then(|| series.iter().position(|b| b.sequence == bar.sequence))
                .flatten()
        });

    match existing {
        Some(idx) => series[idx] = bar,
        None => series.push(bar),
    }
    normalize(series, capacity);
}

/// Stable newest-first sort, drop repeated close times (first wins), trim.
fn normalize(series: &mut Vec<HistoricalBar>, capacity: usize) {
    series.sort_by(|a, b| b.bar_end_timestamp.cmp(&a.bar_end_timestamp));
    series.dedup_by_key(|b| b.bar_end_timestamp);
    series.truncate(capacity);
}

/// True when the series is newest-first with no repeated close time.
pub fn is_canonical(series: &[HistoricalBar]) -> bool {
    series
        .windows(2)
        .all(|w| w[0].bar_end_timestamp > w[1].bar_end_timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Period;
    use rust_decimal_macros::dec;

    fn bar(end: i64, sequence: i64) -> HistoricalBar {
        HistoricalBar {
            instrument: "EURUSD".to_string(),
            period: Period::OneMin,
            bar_end_timestamp: end,
            sequence,
            ..Default::default()
        }
    }

    fn ends(series: &[HistoricalBar]) -> Vec<i64> {
        series.iter().map(|b| b.bar_end_timestamp).collect()
    }

    #[test]
    fn test_live_newest_goes_to_front() {
        let mut series = vec![bar(2, 0), bar(1, 0)];
        merge_live(&mut series, bar(3, 0), 10);
        assert_eq!(ends(&series), vec![3, 2, 1]);
    }

    #[test]
    fn test_live_out_of_order_keeps_ordering() {
        let mut series = vec![bar(5, 0), bar(1, 0)];
        merge_live(&mut series, bar(3, 0), 10);
        assert_eq!(ends(&series), vec![5, 3, 1]);
    }

    #[test]
    fn test_live_same_close_replaces_in_place() {
        let mut series = vec![bar(3, 0), bar(2, 0), bar(1, 0)];
        let mut replacement = bar(2, 0);
        replacement.bid.c = dec!(1.1);
        merge_live(&mut series, replacement, 10);

        assert_eq!(ends(&series), vec![3, 2, 1]);
        assert_eq!(series[1].bid.c, dec!(1.1));
    }

    #[test]
    fn test_live_at_capacity_evicts_oldest() {
        let mut series = vec![bar(3, 0), bar(2, 0), bar(1, 0)];
        merge_live(&mut series, bar(4, 0), 3);
        assert_eq!(ends(&series), vec![4, 3, 2]);
    }

    #[test]
    fn test_historical_sorted_after_each_insert() {
        let mut series = Vec::new();
        for end in [3, 1, 4, 2, 5] {
            merge_historical(&mut series, bar(end, 0), 10);
            assert!(is_canonical(&series));
        }
        assert_eq!(ends(&series), vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_historical_redelivery_replaces_in_place() {
        let mut series = vec![bar(3, 3), bar(2, 2), bar(1, 1)];
        let mut again = bar(2, 2);
        again.bid_atr = Some(dec!(0.0012));
        merge_historical(&mut series, again, 10);

        assert_eq!(series.len(), 3);
        assert_eq!(series[1].bid_atr, Some(dec!(0.0012)));
    }

    #[test]
    fn test_historical_sequence_identity() {
        let mut series = vec![bar(30, 3), bar(20, 2), bar(10, 1)];
        // Same sequence as the bar closing at 20, corrected close time.
        merge_historical(&mut series, bar(25, 2), 10);

        assert_eq!(ends(&series), vec![30, 25, 10]);
        assert!(is_canonical(&series));
    }

    #[test]
    fn test_zero_sequence_is_not_an_identity() {
        let mut series = vec![bar(20, 0), bar(10, 0)];
        merge_historical(&mut series, bar(30, 0), 10);
        assert_eq!(ends(&series), vec![30, 20, 10]);
    }

    #[test]
    fn test_historical_older_than_full_series_is_dropped() {
        let mut series = vec![bar(30, 0), bar(20, 0)];
        merge_historical(&mut series, bar(10, 0), 2);
        assert_eq!(ends(&series), vec![30, 20]);
    }
}
