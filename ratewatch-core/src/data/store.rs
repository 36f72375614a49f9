//! SQLite rate store.
//!
//! One `RateStore` per unit of work (a CLI invocation or a request). Writes
//! open a transaction lazily and stay invisible to other connections until
//! `commit()`. Dropping a store with uncommitted writes rolls them back.
//!
//! `(currency_code, date)` is a real UNIQUE constraint; `exists()` is still
//! offered so callers can skip known rows without provoking a violation.

use crate::domain::{CurrencyCode, HistoryPoint, RateObservation, DATE_FORMAT};
use chrono::NaiveDate;
use log::warn;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use std::path::Path;
use thiserror::Error;

/// Default row cap for filtered listings.
pub const DEFAULT_QUERY_LIMIT: usize = 30;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS rates (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    currency_code TEXT NOT NULL,
    currency_name TEXT NOT NULL,
    mid_rate      REAL,
    bid_rate      REAL,
    ask_rate      REAL,
    date          TEXT NOT NULL,
    UNIQUE (currency_code, date),
    CHECK (mid_rate IS NOT NULL OR (bid_rate IS NOT NULL AND ask_rate IS NOT NULL))
);

CREATE INDEX IF NOT EXISTS idx_rates_currency_date ON rates (currency_code, date);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("corrupt date '{0}' in rates table")]
    CorruptDate(String),
}

/// Optional filters for `RateStore::query`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateFilter {
    pub currency: Option<CurrencyCode>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// `None` lists every matching row.
    pub limit: Option<usize>,
}

impl Default for RateFilter {
    fn default() -> Self {
        Self {
            currency: None,
            start: None,
            end: None,
            limit: Some(DEFAULT_QUERY_LIMIT),
        }
    }
}

pub struct RateStore {
    conn: Connection,
}

impl RateStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// In-memory database (used in tests).
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create the table and index if missing. Idempotent.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Total observations for a currency, or for all currencies when `None`.
    pub fn count(&self, currency: Option<&CurrencyCode>) -> Result<u64, StoreError> {
        let count: i64 = match currency {
            Some(code) => self.conn.query_row(
                "SELECT COUNT(*) FROM rates WHERE currency_code = ?1",
                params![code.as_str()],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM rates", [], |row| row.get(0))?,
        };
        Ok(count as u64)
    }

    /// Observations dated on or after `since`.
    pub fn count_since(&self, currency: &CurrencyCode, since: NaiveDate) -> Result<u64, StoreError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM rates WHERE currency_code = ?1 AND date >= ?2",
            params![currency.as_str(), format_date(since)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn latest_date(&self, currency: &CurrencyCode) -> Result<Option<NaiveDate>, StoreError> {
        let latest: Option<String> = self.conn.query_row(
            "SELECT MAX(date) FROM rates WHERE currency_code = ?1",
            params![currency.as_str()],
            |row| row.get(0),
        )?;
        latest.as_deref().map(parse_date).transpose()
    }

    /// First and last stored dates for a currency.
    pub fn date_range(
        &self,
        currency: &CurrencyCode,
    ) -> Result<Option<(NaiveDate, NaiveDate)>, StoreError> {
        let (first, last): (Option<String>, Option<String>) = self.conn.query_row(
            "SELECT MIN(date), MAX(date) FROM rates WHERE currency_code = ?1",
            params![currency.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        match (first, last) {
            (Some(first), Some(last)) => Ok(Some((parse_date(&first)?, parse_date(&last)?))),
            _ => Ok(None),
        }
    }

    pub fn exists(&self, currency: &CurrencyCode, date: NaiveDate) -> Result<bool, StoreError> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM rates WHERE currency_code = ?1 AND date = ?2 LIMIT 1",
                params![currency.as_str(), format_date(date)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert a bid/ask observation; `mid_rate` is left NULL.
    ///
    /// Returns `Ok(false)` when the row violates a constraint (duplicate day or
    /// missing bid/ask); the violation is logged and the open transaction
    /// stays usable so a batch can continue.
    pub fn insert(
        &mut self,
        currency: &CurrencyCode,
        currency_name: &str,
        bid: Option<f64>,
        ask: Option<f64>,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        self.begin_if_needed()?;

        let result = self.conn.execute(
            "INSERT INTO rates (currency_code, currency_name, mid_rate, bid_rate, ask_rate, date)
             VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
            params![currency.as_str(), currency_name, bid, ask, format_date(date)],
        );

        match result {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::SqliteFailure(err, msg))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                warn!(
                    "skipping {currency} on {date}: {}",
                    msg.unwrap_or_else(|| "constraint violation".into())
                );
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Filtered listing, newest first.
    pub fn query(&self, filter: &RateFilter) -> Result<Vec<RateObservation>, StoreError> {
        let mut sql = String::from(
            "SELECT id, currency_code, currency_name, mid_rate, bid_rate, ask_rate, date
             FROM rates WHERE 1=1",
        );
        let mut args: Vec<Value> = Vec::new();

        if let Some(code) = &filter.currency {
            sql.push_str(" AND currency_code = ?");
            args.push(Value::Text(code.as_str().to_string()));
        }
        if let Some(start) = filter.start {
            sql.push_str(" AND date >= ?");
            args.push(Value::Text(format_date(start)));
        }
        if let Some(end) = filter.end {
            sql.push_str(" AND date <= ?");
            args.push(Value::Text(format_date(end)));
        }
        sql.push_str(" ORDER BY date DESC, currency_code ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            args.push(Value::Integer(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<f64>>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, code, name, mid, bid, ask, date)| {
                Ok(RateObservation {
                    id,
                    currency_code: code,
                    currency_name: name,
                    mid_rate: mid,
                    bid_rate: bid,
                    ask_rate: ask,
                    date: parse_date(&date)?,
                })
            })
            .collect()
    }

    /// Chart columns for a currency, oldest first.
    pub fn history_ascending(
        &self,
        currency: &CurrencyCode,
        start: Option<NaiveDate>,
    ) -> Result<Vec<HistoryPoint>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, mid_rate, bid_rate, ask_rate FROM rates
             WHERE currency_code = ?1 AND (?2 IS NULL OR date >= ?2)
             ORDER BY date ASC",
        )?;
        let rows = stmt
            .query_map(
                params![currency.as_str(), start.map(format_date)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(date, mid, bid, ask)| {
                Ok(HistoryPoint {
                    date: parse_date(&date)?,
                    mid,
                    bid,
                    ask,
                })
            })
            .collect()
    }

    /// Every currency code present in the table, sorted.
    pub fn distinct_currencies(&self) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT currency_code FROM rates ORDER BY currency_code")?;
        let codes = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(codes)
    }

    /// Whether writes are waiting for `commit()`.
    pub fn has_pending_writes(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Make every write since the last commit durable. No-op without writes.
    pub fn commit(&mut self) -> Result<(), StoreError> {
        if self.has_pending_writes() {
            self.conn.execute_batch("COMMIT")?;
        }
        Ok(())
    }

    /// Discard every write since the last commit.
    pub fn rollback(&mut self) -> Result<(), StoreError> {
        if self.has_pending_writes() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        Ok(())
    }

    fn begin_if_needed(&self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl Drop for RateStore {
    fn drop(&mut self) {
        if self.has_pending_writes() {
            warn!("rate store released with uncommitted writes, rolling back");
            let _ = self.conn.execute_batch("ROLLBACK");
        }
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| StoreError::CorruptDate(raw.to_string()))
}
