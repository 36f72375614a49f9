//! ratewatch core: exchange-rate history kept fresh from the NBP tables API.
//!
//! This crate contains:
//! - Domain types (currency codes, observations, upstream tables)
//! - SQLite rate store with an explicit commit boundary
//! - Upstream range fetcher with span chunking and bisection on failure
//! - Reconciliation engine deciding when and what to backfill
//! - Chart series preparation and gap-tolerant summaries
//! - View helpers and a crypto pass-through client for the presentation layer

pub mod config;
pub mod data;
pub mod domain;
pub mod reconcile;
pub mod series;
pub mod view;

pub use config::{AppConfig, ConfigError};
pub use reconcile::{
    needs_update, reconcile_all, ReconcileError, ReconcileReport, ReconcileStatus, Sufficiency,
};
pub use series::{last_valid, prepare, summarize, ChartSeries, RateSummary};
pub use view::{auto_refresh, build_currency_view, CurrencyView, Period};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: values handed across the presentation boundary are
    /// Send + Sync, so a threaded server can move them between workers.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::RateObservation>();
        require_sync::<domain::RateObservation>();
        require_send::<domain::DailyRates>();
        require_sync::<domain::DailyRates>();
        require_send::<domain::TrackedCurrencies>();
        require_sync::<domain::TrackedCurrencies>();

        require_send::<ChartSeries>();
        require_sync::<ChartSeries>();
        require_send::<RateSummary>();
        require_sync::<RateSummary>();
        require_send::<CurrencyView>();
        require_sync::<CurrencyView>();
        require_send::<ReconcileReport>();
        require_sync::<ReconcileReport>();
        require_send::<AppConfig>();
        require_sync::<AppConfig>();

        require_send::<data::NbpClient>();
        require_sync::<data::NbpClient>();
        require_send::<data::CryptoClient>();
        require_sync::<data::CryptoClient>();
    }

    /// A store is moved into a unit of work, never shared across threads.
    #[test]
    fn rate_store_is_send() {
        fn require_send<T: Send>() {}
        require_send::<data::RateStore>();
    }
}
