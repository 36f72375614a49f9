//! Range fetcher: splits long ranges into API-sized windows and bisects
//! windows whose request fails.
//!
//! Requests are issued sequentially. Failures never propagate: a window that
//! cannot be fetched contributes nothing, and the caller treats "empty" as
//! "nothing available".

use super::provider::RateSource;
use crate::domain::{DailyRates, TableKind};
use chrono::{Duration, NaiveDate};
use log::{debug, error, warn};

/// Longest span (end - start, in days) one upstream request may cover.
pub const MAX_SPAN_DAYS: i64 = 366;

/// Failed windows longer than this are bisected; shorter ones give up.
pub const BISECT_MIN_SPAN_DAYS: i64 = 30;

/// Fetch every table in `[start, end]`, chronologically.
pub fn fetch_range(
    source: &dyn RateSource,
    start: NaiveDate,
    end: NaiveDate,
    kind: TableKind,
) -> Vec<DailyRates> {
    if start > end {
        return Vec::new();
    }

    let span = (end - start).num_days();
    if span > MAX_SPAN_DAYS {
        let mut all = Vec::new();
        for (chunk_start, chunk_end) in split_windows(start, end) {
            all.extend(fetch_range(source, chunk_start, chunk_end, kind));
        }
        return all;
    }

    match source.fetch_tables(kind, start, end) {
        Ok(tables) => {
            debug!(
                "{}: table {kind} {start}..={end} returned {} days",
                source.name(),
                tables.len()
            );
            tables
        }
        Err(e) if span > BISECT_MIN_SPAN_DAYS => {
            let mid = start + Duration::days(span / 2);
            warn!(
                "{}: table {kind} {start}..={end} failed ({e}), retrying as {start}..={mid} and {}..={end}",
                source.name(),
                mid + Duration::days(1)
            );
            let mut first = fetch_range(source, start, mid, kind);
            first.extend(fetch_range(source, mid + Duration::days(1), end, kind));
            first
        }
        Err(e) => {
            error!(
                "{}: table {kind} {start}..={end} failed ({e}), no data for this window",
                source.name()
            );
            Vec::new()
        }
    }
}

/// Consecutive windows of at most `MAX_SPAN_DAYS` covering `[start, end]`.
///
/// Each window starts the day after the previous one ends.
pub fn split_windows(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut windows = Vec::new();
    let mut current = start;
    while current <= end {
        let window_end = (current + Duration::days(MAX_SPAN_DAYS)).min(end);
        windows.push((current, window_end));
        current = window_end + Duration::days(1);
    }
    windows
}
