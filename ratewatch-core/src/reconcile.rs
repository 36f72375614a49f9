//! Reconciliation: decide per tracked currency whether stored history is
//! sufficient, and if not, backfill from the day after the latest stored
//! observation up to today.
//!
//! Nothing here is persisted between runs; every call re-derives the state
//! from the store. Re-running with no upstream change stores nothing new
//! because each row is existence-checked before insertion.

use crate::data::fetch::fetch_range;
use crate::data::provider::RateSource;
use crate::data::store::{RateStore, StoreError};
use crate::domain::{CurrencyCode, FetchWindow, TableKind, TrackedCurrencies};
use chrono::{Duration, NaiveDate};
use log::{error, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Below this many rows a currency always needs backfill.
pub const MIN_TOTAL_RECORDS: u64 = 50;

/// A currency with no recent rows needs backfill while below this many rows.
pub const STALE_TOTAL_CEILING: u64 = 500;

/// `needs_update` fires for a currency with no recent rows below this many rows.
pub const AUTO_UPDATE_TOTAL_CEILING: u64 = 100;

/// "Recent" means dated within this many days of today.
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// How far back an empty currency is backfilled.
pub const INITIAL_BACKFILL_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("store error while classifying {currency}: {source}")]
    Store {
        currency: CurrencyCode,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sufficiency {
    Sufficient,
    NeedsBackfill,
}

/// Classify a currency from its total and recent row counts.
pub fn classify(total: u64, recent: u64) -> Sufficiency {
    if total < MIN_TOTAL_RECORDS || (recent == 0 && total < STALE_TOTAL_CEILING) {
        Sufficiency::NeedsBackfill
    } else {
        Sufficiency::Sufficient
    }
}

/// The cheaper staleness test used before rendering.
pub fn is_stale_for_refresh(total: u64, recent: u64) -> bool {
    recent == 0 && total < AUTO_UPDATE_TOTAL_CEILING
}

/// Earliest date counted as recent.
pub fn recent_cutoff(today: NaiveDate) -> NaiveDate {
    today - Duration::days(RECENT_WINDOW_DAYS)
}

/// First day to backfill, or `None` when the store is already caught up.
pub fn backfill_start(latest: Option<NaiveDate>, today: NaiveDate) -> Option<NaiveDate> {
    let start = match latest {
        Some(latest) => latest + Duration::days(1),
        None => today - Duration::days(INITIAL_BACKFILL_DAYS),
    };
    (start <= today).then_some(start)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileStatus {
    /// At least one currency needed backfill.
    Updated,
    /// Every currency was sufficient.
    Complete,
}

/// What happened to one currency during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CurrencyOutcome {
    Sufficient,
    /// Needed backfill but the latest stored date is already today.
    CaughtUp,
    Backfilled { window: FetchWindow, stored: usize },
    /// The backfill batch was rolled back.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyReport {
    pub currency: CurrencyCode,
    pub total_before: u64,
    pub recent_before: u64,
    pub outcome: CurrencyOutcome,
}

impl CurrencyReport {
    pub fn needed_backfill(&self) -> bool {
        !matches!(self.outcome, CurrencyOutcome::Sufficient)
    }

    pub fn stored(&self) -> usize {
        match self.outcome {
            CurrencyOutcome::Backfilled { stored, .. } => stored,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub status: ReconcileStatus,
    pub stored_count: usize,
    pub currencies: Vec<CurrencyReport>,
}

impl ReconcileReport {
    fn from_currencies(currencies: Vec<CurrencyReport>) -> Self {
        let status = if currencies.iter().any(CurrencyReport::needed_backfill) {
            ReconcileStatus::Updated
        } else {
            ReconcileStatus::Complete
        };
        let stored_count = currencies.iter().map(CurrencyReport::stored).sum();
        Self {
            status,
            stored_count,
            currencies,
        }
    }

    pub fn message(&self) -> String {
        match self.status {
            ReconcileStatus::Updated => format!(
                "Missing data detected and updated: Stored {} new records.",
                self.stored_count
            ),
            ReconcileStatus::Complete => "All currencies have sufficient historical data.".into(),
        }
    }
}

/// Run reconciliation for every tracked currency.
///
/// Store errors while reading a currency's counts abort the run. Store errors
/// while writing its backfill roll that currency back, are reported as
/// `CurrencyOutcome::Failed`, and the run moves on to the next currency.
pub fn reconcile_all(
    store: &mut RateStore,
    source: &dyn RateSource,
    tracked: &TrackedCurrencies,
    today: NaiveDate,
) -> Result<ReconcileReport, ReconcileError> {
    let mut reports = Vec::with_capacity(tracked.len());

    for currency in tracked.codes() {
        let wrap = |err: StoreError| ReconcileError::Store {
            currency: currency.clone(),
            source: err,
        };
        let total = store.count(Some(currency)).map_err(wrap)?;
        let recent = store.count_since(currency, recent_cutoff(today)).map_err(wrap)?;

        let outcome = match classify(total, recent) {
            Sufficiency::Sufficient => CurrencyOutcome::Sufficient,
            Sufficiency::NeedsBackfill => {
                info!("{currency} needs backfill: {total} total records, {recent} recent records");
                match backfill_currency(store, source, currency, today) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!("backfill for {currency} failed, discarding batch: {e}");
                        if let Err(rb) = store.rollback() {
                            error!("rollback for {currency} failed: {rb}");
                        }
                        CurrencyOutcome::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
        };

        reports.push(CurrencyReport {
            currency: currency.clone(),
            total_before: total,
            recent_before: recent,
            outcome,
        });
    }

    let report = ReconcileReport::from_currencies(reports);
    info!("{}", report.message());
    Ok(report)
}

/// Fetch and store the missing window for one currency, then commit once.
fn backfill_currency(
    store: &mut RateStore,
    source: &dyn RateSource,
    currency: &CurrencyCode,
    today: NaiveDate,
) -> Result<CurrencyOutcome, StoreError> {
    let latest = store.latest_date(currency)?;
    let Some(start) = backfill_start(latest, today) else {
        info!("{currency} is already caught up (latest {latest:?})");
        return Ok(CurrencyOutcome::CaughtUp);
    };

    let window = FetchWindow {
        currency: currency.clone(),
        start,
        end: today,
    };
    info!("fetching {window} ({} days)", window.days());

    let tables = fetch_range(source, window.start, window.end, TableKind::BidAsk);

    let mut stored = 0;
    for day in &tables {
        let Some(quote) = day.get(currency) else {
            continue;
        };
        if store.exists(currency, day.effective_date)? {
            continue;
        }
        if store.insert(currency, &quote.name, quote.bid, quote.ask, day.effective_date)? {
            stored += 1;
        }
    }
    store.commit()?;

    info!("{currency}: stored {stored} new records from {} tables", tables.len());
    Ok(CurrencyOutcome::Backfilled { window, stored })
}

/// Whether any tracked currency is stale enough to justify `reconcile_all`
/// before rendering.
pub fn needs_update(
    store: &RateStore,
    tracked: &TrackedCurrencies,
    today: NaiveDate,
) -> Result<bool, StoreError> {
    for currency in tracked.codes() {
        let recent = store.count_since(currency, recent_cutoff(today))?;
        let total = store.count(Some(currency))?;
        if is_stale_for_refresh(total, recent) {
            info!("{currency} has no recent data ({recent} recent, {total} total), update needed");
            return Ok(true);
        }
    }
    Ok(false)
}
