mod common;

use chrono::Duration;
use common::{date, weekdays_between, ScriptedSource};
use ratewatch_core::data::fetch_range;
use ratewatch_core::domain::TableKind;

#[test]
fn four_hundred_days_is_two_contiguous_requests() {
    let source = ScriptedSource::new(&["USD"]);
    let start = date(2023, 1, 2);
    let end = start + Duration::days(400);

    let tables = fetch_range(&source, start, end, TableKind::BidAsk);

    let calls = source.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, start);
    assert_eq!(calls[1].0, calls[0].1 + Duration::days(1));
    assert_eq!(calls[1].1, end);
    assert_eq!(tables.len(), weekdays_between(start, end));
}

#[test]
fn failing_long_window_is_bisected_until_it_succeeds() {
    let source = ScriptedSource::new(&["USD"]).failing_when_span_over(40);
    let start = date(2024, 1, 1);
    let end = start + Duration::days(100);

    let tables = fetch_range(&source, start, end, TableKind::BidAsk);

    assert_eq!(tables.len(), weekdays_between(start, end));
    let calls = source.calls();
    // 100 fails, both halves of 50 fail, the four quarters succeed.
    assert_eq!(calls.len(), 7);
    assert_eq!(calls[0], (start, end));
    assert_eq!(calls[1], (start, start + Duration::days(50)));

    let dates: Vec<_> = tables.iter().map(|t| t.effective_date).collect();
    assert!(dates.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn failing_short_window_gives_up_without_retry() {
    let source = ScriptedSource::new(&["USD"]).always_failing();
    let start = date(2024, 1, 1);

    let tables = fetch_range(&source, start, start + Duration::days(30), TableKind::Mid);

    assert!(tables.is_empty());
    assert_eq!(source.calls().len(), 1);
}

#[test]
fn persistent_failure_bottoms_out_at_short_windows() {
    let source = ScriptedSource::new(&["USD"]).always_failing();
    let start = date(2024, 1, 1);

    let tables = fetch_range(&source, start, start + Duration::days(62), TableKind::BidAsk);

    assert!(tables.is_empty());
    // 62 -> 31 + 30 -> the 31-day half splits once more.
    let calls = source.calls();
    assert_eq!(calls.len(), 5);
    assert!(calls.iter().all(|(s, e)| (*e - *s).num_days() <= 62));
}

#[test]
fn inverted_range_makes_no_request() {
    let source = ScriptedSource::new(&["USD"]);
    let tables = fetch_range(&source, date(2024, 2, 1), date(2024, 1, 1), TableKind::BidAsk);
    assert!(tables.is_empty());
    assert!(source.calls().is_empty());
}

#[test]
fn single_day_range_is_one_request() {
    let source = ScriptedSource::new(&["USD"]);
    let day = date(2024, 6, 14);
    let tables = fetch_range(&source, day, day, TableKind::BidAsk);
    assert_eq!(tables.len(), 1);
    assert_eq!(source.calls(), vec![(day, day)]);
}
