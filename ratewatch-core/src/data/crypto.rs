//! Top cryptocurrencies by market cap, passed through untouched.

use super::provider::FetchError;
use log::{debug, warn};
use std::time::Duration;

pub const DEFAULT_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";

pub struct CryptoClient {
    client: reqwest::blocking::Client,
    markets_url: String,
}

impl CryptoClient {
    pub fn new(markets_url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ratewatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientSetup(e.to_string()))?;

        Ok(Self {
            client,
            markets_url: markets_url.into(),
        })
    }

    /// Query parameters for a top-`limit` request priced in USD.
    fn market_params(limit: usize) -> Vec<(&'static str, String)> {
        vec![
            ("vs_currency", "usd".to_string()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", limit.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h,7d".to_string()),
        ]
    }

    /// Fetch the top `limit` assets. Each element is the provider's JSON object.
    pub fn top_assets(&self, limit: usize) -> Result<Vec<serde_json::Value>, FetchError> {
        debug!("fetching top {limit} crypto assets from {}", self.markets_url);

        let resp = self
            .client
            .get(&self.markets_url)
            .query(&Self::market_params(limit))
            .send()
            .map_err(|e| FetchError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: self.markets_url.clone(),
            });
        }

        let body: serde_json::Value = resp
            .json()
            .map_err(|e| FetchError::ResponseFormatChanged(format!("crypto markets: {e}")))?;

        Ok(into_assets(body))
    }

    /// Like `top_assets`, but an unreachable or failing upstream yields an
    /// empty list so the caller can show a "no data" message instead.
    pub fn top_assets_or_empty(&self, limit: usize) -> Vec<serde_json::Value> {
        self.top_assets(limit).unwrap_or_else(|e| {
            warn!("crypto markets unavailable: {e}");
            Vec::new()
        })
    }
}

fn into_assets(body: serde_json::Value) -> Vec<serde_json::Value> {
    match body {
        serde_json::Value::Array(items) => items,
        _ => {
            warn!("crypto markets body is not an array, treating as empty");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn params_request_market_cap_order() {
        let params = CryptoClient::market_params(10);
        assert!(params.contains(&("per_page", "10".to_string())));
        assert!(params.contains(&("order", "market_cap_desc".to_string())));
        assert!(params.contains(&("price_change_percentage", "24h,7d".to_string())));
    }

    #[test]
    fn array_body_passes_through() {
        let assets = into_assets(json!([{"id": "bitcoin", "current_price": 1.0}]));
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0]["id"], "bitcoin");
    }

    #[test]
    fn unreachable_upstream_degrades_to_empty() {
        // Nothing listens on the discard port.
        let client =
            CryptoClient::new("http://127.0.0.1:9/markets", Duration::from_secs(2)).unwrap();
        assert!(client.top_assets(10).is_err());
        assert!(client.top_assets_or_empty(10).is_empty());
    }

    #[test]
    fn object_body_is_empty() {
        assert!(into_assets(json!({"error": "rate limited"})).is_empty());
    }
}
