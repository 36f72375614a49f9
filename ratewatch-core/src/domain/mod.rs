//! Domain types for ratewatch

pub mod currency;
pub mod rate;

pub use currency::{CurrencyCode, CurrencyCodeError, TrackedCurrencies};
pub use rate::{
    DailyRates, FetchWindow, HistoryPoint, QuotedRate, RateObservation, TableKind, DATE_FORMAT,
};
