//! Rate source trait and structured error types.
//!
//! `RateSource` abstracts a single literal upstream request so the chunking
//! and bisection logic in `fetch` can run against the real NBP client or a
//! scripted source in tests.

use crate::domain::{DailyRates, TableKind};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors from one upstream request.
///
/// None of these escape the range fetcher: they trigger bisection or collapse
/// to an empty window.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("http client setup failed: {0}")]
    ClientSetup(String),
}

/// One upstream request for a literal date range.
pub trait RateSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch every table published in `[start, end]`.
    ///
    /// Implementations drop malformed days themselves; a returned table always
    /// has an effective date and at least one rate.
    fn fetch_tables(
        &self,
        kind: TableKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyRates>, FetchError>;
}
