//! Upstream sources and local storage

pub mod crypto;
pub mod fetch;
pub mod nbp;
pub mod provider;
pub mod store;

pub use crypto::CryptoClient;
pub use fetch::{fetch_range, split_windows, BISECT_MIN_SPAN_DAYS, MAX_SPAN_DAYS};
pub use nbp::NbpClient;
pub use provider::{FetchError, RateSource};
pub use store::{RateFilter, RateStore, StoreError, DEFAULT_QUERY_LIMIT};
