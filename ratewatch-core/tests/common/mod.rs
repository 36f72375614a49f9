//! Scripted upstream used by the integration tests.
#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use ratewatch_core::data::{FetchError, RateSource};
use ratewatch_core::domain::{CurrencyCode, DailyRates, QuotedRate, TableKind};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn code(raw: &str) -> CurrencyCode {
    CurrencyCode::parse(raw).unwrap()
}

pub fn is_weekday(d: NaiveDate) -> bool {
    d.weekday().number_from_monday() <= 5
}

/// Weekdays in `[start, end]`.
pub fn weekdays_between(start: NaiveDate, end: NaiveDate) -> usize {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_weekday(*d))
        .count()
}

/// Publishes a bid/ask table every weekday, optionally only from a given
/// date, and fails requests according to its script.
pub struct ScriptedSource {
    currencies: Vec<(String, String)>,
    published_from: Option<NaiveDate>,
    fail_when_span_over: Option<i64>,
    fail_always: bool,
    calls: Mutex<Vec<(NaiveDate, NaiveDate)>>,
}

impl ScriptedSource {
    pub fn new(codes: &[&str]) -> Self {
        Self {
            currencies: codes
                .iter()
                .map(|c| (c.to_string(), format!("currency {c}")))
                .collect(),
            published_from: None,
            fail_when_span_over: None,
            fail_always: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Only tables dated on or after `from` exist.
    pub fn published_from(mut self, from: NaiveDate) -> Self {
        self.published_from = Some(from);
        self
    }

    /// Requests whose span (end - start) exceeds `days` fail with HTTP 500.
    pub fn failing_when_span_over(mut self, days: i64) -> Self {
        self.fail_when_span_over = Some(days);
        self
    }

    pub fn always_failing(mut self) -> Self {
        self.fail_always = true;
        self
    }

    pub fn calls(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn table_for(&self, day: NaiveDate) -> DailyRates {
        let offset = day.ordinal() as f64 / 1000.0;
        let rates: BTreeMap<CurrencyCode, QuotedRate> = self
            .currencies
            .iter()
            .enumerate()
            .map(|(i, (c, name))| {
                let base = 3.5 + i as f64 + offset;
                (
                    code(c),
                    QuotedRate {
                        name: name.clone(),
                        bid: Some(base),
                        ask: Some(base + 0.08),
                        mid: None,
                    },
                )
            })
            .collect();
        DailyRates {
            effective_date: day,
            rates,
        }
    }
}

impl RateSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    fn fetch_tables(
        &self,
        kind: TableKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRates>, FetchError> {
        self.calls.lock().unwrap().push((start, end));

        let span = (end - start).num_days();
        let too_long = self.fail_when_span_over.is_some_and(|max| span > max);
        if self.fail_always || too_long {
            return Err(FetchError::HttpStatus {
                status: 500,
                url: format!("scripted/{kind}/{start}/{end}"),
            });
        }

        Ok(start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| is_weekday(*d))
            .filter(|d| self.published_from.map_or(true, |from| *d >= from))
            .map(|d| self.table_for(d))
            .collect())
    }
}
