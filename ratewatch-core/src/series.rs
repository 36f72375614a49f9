//! Chart series and summary statistics over sparse rate history.
//!
//! Mid, bid and ask are published with independent gaps, so every column
//! keeps its nulls and the summary never surfaces one: the current value is
//! taken from the latest valid point, the previous value from the earliest.

use crate::domain::{HistoryPoint, DATE_FORMAT};
use serde::{Deserialize, Serialize};

/// Columnar projection of a history, ready for a charting front end.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub mid: Vec<Option<f64>>,
    pub bid: Vec<Option<f64>>,
    pub ask: Vec<Option<f64>>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Current value and its change against the start of the period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RateSummary {
    pub current: f64,
    pub change: f64,
    pub change_percent: f64,
}

/// Project history rows into columns, preserving order and nulls.
pub fn prepare(history: &[HistoryPoint]) -> ChartSeries {
    ChartSeries {
        dates: history
            .iter()
            .map(|p| p.date.format(DATE_FORMAT).to_string())
            .collect(),
        mid: history.iter().map(|p| p.mid).collect(),
        bid: history.iter().map(|p| p.bid).collect(),
        ask: history.iter().map(|p| p.ask).collect(),
    }
}

/// Last non-null value, scanning from the end.
pub fn last_valid(series: &[Option<f64>]) -> Option<f64> {
    series.iter().rev().find_map(|v| *v)
}

fn average(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

/// Current rate, absolute change and percent change.
///
/// `current` is the last valid mid, else the mean of the last valid bid and
/// ask, else 0. `previous` is the first valid mid before the final point,
/// else the mean of the first bid and ask when both are present and non-zero.
/// Change stays 0 with fewer than two points or no usable `previous`.
pub fn summarize(mid: &[Option<f64>], bid: &[Option<f64>], ask: &[Option<f64>]) -> RateSummary {
    if mid.is_empty() && bid.is_empty() {
        return RateSummary::default();
    }

    let current = match last_valid(mid) {
        Some(v) => v,
        None => match (last_valid(bid), last_valid(ask)) {
            (Some(b), Some(a)) => average(b, a),
            _ => 0.0,
        },
    };

    let points = if mid.is_empty() { bid.len() } else { mid.len() };
    if points < 2 {
        return RateSummary {
            current,
            ..RateSummary::default()
        };
    }

    let previous = mid[..mid.len().min(points - 1)]
        .iter()
        .find_map(|v| *v)
        .or_else(|| match (bid.first().copied().flatten(), ask.first().copied().flatten()) {
            (Some(b), Some(a)) if b != 0.0 && a != 0.0 => Some(average(b, a)),
            _ => None,
        });

    match previous {
        Some(prev) if prev != 0.0 => {
            let change = current - prev;
            RateSummary {
                current,
                change,
                change_percent: change / prev * 100.0,
            }
        }
        _ => RateSummary {
            current,
            ..RateSummary::default()
        },
    }
}

/// Summary computed straight from a prepared series.
pub fn summarize_series(series: &ChartSeries) -> RateSummary {
    summarize(&series.mid, &series.bid, &series.ask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn prepare_empty() {
        let series = prepare(&[]);
        assert!(series.dates.is_empty());
        assert!(series.mid.is_empty());
        assert!(series.bid.is_empty());
        assert!(series.ask.is_empty());
    }

    #[test]
    fn prepare_keeps_order_and_nulls() {
        let history = vec![
            HistoryPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                mid: None,
                bid: Some(3.9),
                ask: Some(4.0),
            },
            HistoryPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                mid: Some(3.95),
                bid: None,
                ask: None,
            },
        ];
        let series = prepare(&history);
        assert_eq!(series.dates, vec!["2024-01-02", "2024-01-03"]);
        assert_eq!(series.mid, vec![None, Some(3.95)]);
        assert_eq!(series.bid, vec![Some(3.9), None]);
        assert_eq!(series.ask, vec![Some(4.0), None]);
    }

    #[test]
    fn prepare_serializes_with_chart_keys() {
        let json = serde_json::to_value(prepare(&[])).unwrap();
        for key in ["dates", "mid", "bid", "ask"] {
            assert!(json[key].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn last_valid_scans_from_end() {
        assert_eq!(last_valid(&[Some(1.0), Some(2.0), None]), Some(2.0));
        assert_eq!(last_valid(&[None, None]), None);
        assert_eq!(last_valid(&[]), None);
    }

    #[test]
    fn summarize_empty_is_zero() {
        assert_eq!(summarize(&[], &[], &[]), RateSummary::default());
    }

    #[test]
    fn summarize_single_point() {
        let s = summarize(&[Some(7.0)], &[], &[]);
        assert_eq!(s.current, 7.0);
        assert_eq!(s.change, 0.0);
        assert_eq!(s.change_percent, 0.0);
    }

    #[test]
    fn summarize_falls_back_to_first_bid_ask() {
        let s = summarize(
            &[None, None, Some(5.0)],
            &[Some(1.0), None, None],
            &[Some(2.0), None, None],
        );
        assert_eq!(s.current, 5.0);
        assert!(approx(s.change, 3.5));
        assert!(approx(s.change_percent, 233.333_333_333_333_3));
    }

    #[test]
    fn summarize_uses_first_valid_mid() {
        let s = summarize(&[None, Some(4.0), Some(5.0)], &[], &[]);
        assert!(approx(s.change, 1.0));
        assert!(approx(s.change_percent, 25.0));
    }

    #[test]
    fn summarize_ignores_final_mid_as_previous() {
        // The only valid mid is the last point, and bid/ask give no fallback.
        let s = summarize(&[None, Some(5.0)], &[None, Some(4.9)], &[None, Some(5.1)]);
        assert_eq!(s.current, 5.0);
        assert_eq!(s.change, 0.0);
        assert_eq!(s.change_percent, 0.0);
    }

    #[test]
    fn summarize_bid_ask_only_history() {
        let s = summarize(
            &[None, None],
            &[Some(3.9), Some(4.1)],
            &[Some(4.1), Some(4.3)],
        );
        assert!(approx(s.current, 4.2));
        assert!(approx(s.change, 0.2));
        assert!(approx(s.change_percent, 5.0));
    }

    #[test]
    fn summarize_zero_previous_leaves_change_zero() {
        let s = summarize(&[None, None, Some(5.0)], &[Some(0.0), None, None], &[Some(2.0), None, None]);
        assert_eq!(s.current, 5.0);
        assert_eq!(s.change, 0.0);
    }

    #[test]
    fn summarize_without_any_current_uses_zero() {
        let s = summarize(&[None, None], &[Some(1.0), None], &[None, None]);
        assert_eq!(s.current, 0.0);
        assert_eq!(s.change, 0.0);
    }
}
