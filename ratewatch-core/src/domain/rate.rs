use super::currency::CurrencyCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Date format used for storage, upstream URLs and JSON output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One stored row: a currency's quotation on one calendar day.
///
/// `(currency_code, date)` is the identity; `id` is a surrogate assigned by
/// the store and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateObservation {
    pub id: i64,
    pub currency_code: String,
    pub currency_name: String,
    pub mid_rate: Option<f64>,
    pub bid_rate: Option<f64>,
    pub ask_rate: Option<f64>,
    pub date: NaiveDate,
}

/// The columns charting needs, in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub mid: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
}

/// Upstream table flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Table A: mid rates only.
    Mid,
    /// Table C: bid and ask rates.
    BidAsk,
}

impl TableKind {
    pub fn letter(self) -> char {
        match self {
            TableKind::Mid => 'A',
            TableKind::BidAsk => 'C',
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// A single currency's entry in one day's upstream table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotedRate {
    pub name: String,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub mid: Option<f64>,
}

/// One upstream table: every quoted currency for an effective date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRates {
    pub effective_date: NaiveDate,
    pub rates: BTreeMap<CurrencyCode, QuotedRate>,
}

impl DailyRates {
    pub fn get(&self, code: &CurrencyCode) -> Option<&QuotedRate> {
        self.rates.get(code)
    }
}

/// A gap to fill for one currency. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub currency: CurrencyCode,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// Inclusive length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}..={}", self.currency, self.start, self.end)
    }
}
