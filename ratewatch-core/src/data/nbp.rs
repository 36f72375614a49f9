//! NBP (Narodowy Bank Polski) exchange-rate table client.
//!
//! Fetches table A (mid) or table C (bid/ask) for a date range from
//! `{base}/{table}/{start}/{end}/?format=json`. The API caps one request at
//! roughly a year; splitting is the range fetcher's job, not this client's.

use super::provider::{FetchError, RateSource};
use crate::domain::{CurrencyCode, DailyRates, QuotedRate, TableKind, DATE_FORMAT};
use chrono::NaiveDate;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.nbp.pl/api/exchangerates/tables";

/// One day's table as the API returns it. Every field is optional so a
/// malformed day can be dropped without failing the whole payload.
#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(rename = "effectiveDate")]
    effective_date: Option<String>,
    rates: Option<Vec<RawRate>>,
}

#[derive(Debug, Deserialize)]
struct RawRate {
    code: Option<String>,
    currency: Option<String>,
    bid: Option<f64>,
    ask: Option<f64>,
    mid: Option<f64>,
}

/// Blocking HTTP client for the NBP tables API.
pub struct NbpClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl NbpClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ratewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build the table URL for a kind and date range.
    fn table_url(&self, kind: TableKind, start: NaiveDate, end: NaiveDate) -> String {
        format!(
            "{}/{}/{}/{}/?format=json",
            self.base_url,
            kind.letter(),
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT)
        )
    }
}

impl RateSource for NbpClient {
    fn name(&self) -> &str {
        "nbp"
    }

    fn fetch_tables(
        &self,
        kind: TableKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRates>, FetchError> {
        let url = self.table_url(kind, start, end);
        debug!("fetching {url}");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if is_no_data(status) {
            debug!("no tables published for {url}");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let body: serde_json::Value = resp.json().map_err(|e| {
            FetchError::ResponseFormatChanged(format!("failed to parse response from {url}: {e}"))
        })?;

        Ok(parse_tables(body))
    }
}

/// NBP answers 404 ("Brak danych") for a range without any published table,
/// e.g. a weekend. That is an empty result, not a failure.
fn is_no_data(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::NOT_FOUND
}

/// Turn a decoded response body into daily tables.
///
/// A non-array body yields nothing. Days without an effective date or without
/// any rates are dropped, as are rate entries without a valid code.
pub fn parse_tables(body: serde_json::Value) -> Vec<DailyRates> {
    let serde_json::Value::Array(items) = body else {
        warn!("upstream body is not an array, treating as empty");
        return Vec::new();
    };

    let mut days = Vec::with_capacity(items.len());
    for item in items {
        let raw: RawTable = match serde_json::from_value(item) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("dropping undecodable table: {e}");
                continue;
            }
        };
        if let Some(day) = convert_table(raw) {
            days.push(day);
        }
    }
    days
}

fn convert_table(raw: RawTable) -> Option<DailyRates> {
    let date_str = raw.effective_date.filter(|d| !d.is_empty());
    let raw_rates = raw.rates.filter(|r| !r.is_empty());

    let (Some(date_str), Some(raw_rates)) = (date_str, raw_rates) else {
        warn!("dropping table without effective date or rates");
        return None;
    };

    let Ok(effective_date) = NaiveDate::parse_from_str(&date_str, DATE_FORMAT) else {
        warn!("dropping table with unparseable effective date '{date_str}'");
        return None;
    };

    let mut rates = BTreeMap::new();
    for rate in raw_rates {
        let Some(code) = rate.code.as_deref().and_then(|c| CurrencyCode::parse(c).ok()) else {
            debug!("skipping rate entry without a valid code on {effective_date}");
            continue;
        };
        rates.insert(
            code,
            QuotedRate {
                name: rate.currency.unwrap_or_default(),
                bid: rate.bid,
                ask: rate.ask,
                mid: rate.mid,
            },
        );
    }

    if rates.is_empty() {
        warn!("dropping table for {effective_date}: no usable rates");
        return None;
    }

    Some(DailyRates {
        effective_date,
        rates,
    })
}
