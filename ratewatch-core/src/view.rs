//! Helpers for the presentation boundary: period selection, the per-currency
//! view, and the cheap "refresh before render" hook.

use crate::data::provider::RateSource;
use crate::data::store::{RateStore, StoreError};
use crate::domain::{CurrencyCode, TrackedCurrencies};
use crate::reconcile::{needs_update, reconcile_all, ReconcileReport};
use crate::series::{last_valid, prepare, summarize_series, ChartSeries, RateSummary};
use chrono::{Duration, NaiveDate};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chart period keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "7days")]
    SevenDays,
    #[default]
    #[serde(rename = "1month")]
    OneMonth,
    #[serde(rename = "6months")]
    SixMonths,
    #[serde(rename = "1year")]
    OneYear,
}

impl Period {
    pub const ALL: [Period; 4] = [
        Period::SevenDays,
        Period::OneMonth,
        Period::SixMonths,
        Period::OneYear,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            Period::SevenDays => "7days",
            Period::OneMonth => "1month",
            Period::SixMonths => "6months",
            Period::OneYear => "1year",
        }
    }

    pub fn days(self) -> i64 {
        match self {
            Period::SevenDays => 7,
            Period::OneMonth => 30,
            Period::SixMonths => 180,
            Period::OneYear => 365,
        }
    }

    pub fn start_date(self, today: NaiveDate) -> NaiveDate {
        today - Duration::days(self.days())
    }

    /// Parse a keyword, falling back to the default period for anything else.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::ALL
            .into_iter()
            .find(|p| p.keyword() == s)
            .ok_or_else(|| format!("unknown period '{s}'. Valid: 7days, 1month, 6months, 1year"))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Everything a page needs to render one currency over one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CurrencyView {
    /// No stored rows in the period. Not an error.
    Empty {
        currency: CurrencyCode,
        period: Period,
        message: String,
    },
    Data {
        currency: CurrencyCode,
        period: Period,
        series: ChartSeries,
        summary: RateSummary,
        current_bid: Option<f64>,
        current_ask: Option<f64>,
        first_date: String,
        last_date: String,
        points: usize,
    },
}

impl CurrencyView {
    pub fn is_empty(&self) -> bool {
        matches!(self, CurrencyView::Empty { .. })
    }

    /// One-line description of the covered range.
    pub fn date_info(&self) -> String {
        match self {
            CurrencyView::Empty { message, .. } => message.clone(),
            CurrencyView::Data {
                first_date,
                last_date,
                points,
                ..
            } => format!("From {first_date} to {last_date} ({points} data points)"),
        }
    }
}

/// Resolve the requested currency against the tracked set.
///
/// Unknown or malformed input selects the first tracked currency.
pub fn select_currency(requested: Option<&str>, tracked: &TrackedCurrencies) -> Option<CurrencyCode> {
    requested
        .and_then(|raw| CurrencyCode::parse(raw).ok())
        .filter(|code| tracked.contains(code))
        .or_else(|| tracked.primary().cloned())
}

pub fn build_currency_view(
    store: &RateStore,
    currency: &CurrencyCode,
    period: Period,
    today: NaiveDate,
) -> Result<CurrencyView, StoreError> {
    let history = store.history_ascending(currency, Some(period.start_date(today)))?;
    if history.is_empty() {
        return Ok(CurrencyView::Empty {
            currency: currency.clone(),
            period,
            message: format!("No historical data for {currency} in the selected period."),
        });
    }

    let series = prepare(&history);
    let summary = summarize_series(&series);
    let current_bid = last_valid(&series.bid);
    let current_ask = last_valid(&series.ask);
    let points = series.len();
    let first_date = series.dates.first().cloned().unwrap_or_default();
    let last_date = series.dates.last().cloned().unwrap_or_default();

    Ok(CurrencyView::Data {
        currency: currency.clone(),
        period,
        series,
        summary,
        current_bid,
        current_ask,
        first_date,
        last_date,
        points,
    })
}

/// Reconcile before rendering when `needs_update` says so.
///
/// Never fails: problems are logged and the page renders whatever is stored.
pub fn auto_refresh(
    store: &mut RateStore,
    source: &dyn RateSource,
    tracked: &TrackedCurrencies,
    today: NaiveDate,
) -> Option<ReconcileReport> {
    match needs_update(store, tracked, today) {
        Ok(false) => None,
        Ok(true) => match reconcile_all(store, source, tracked, today) {
            Ok(report) => {
                info!("auto-update completed: {}", report.message());
                Some(report)
            }
            Err(e) => {
                error!("auto-update failed: {e}");
                None
            }
        },
        Err(e) => {
            warn!("could not check whether an update is needed: {e}");
            None
        }
    }
}
