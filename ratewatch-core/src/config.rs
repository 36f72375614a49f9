//! Application configuration loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working setup against the public NBP and CoinGecko endpoints.

use crate::data::crypto::DEFAULT_MARKETS_URL;
use crate::data::nbp::DEFAULT_BASE_URL;
use crate::domain::{CurrencyCode, TrackedCurrencies};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub nbp_base_url: String,
    pub crypto_api_url: String,
    pub tracked_currencies: Vec<CurrencyCode>,
    pub http_timeout_secs: u64,
    pub crypto_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("currency_rates.db"),
            nbp_base_url: DEFAULT_BASE_URL.to_string(),
            crypto_api_url: DEFAULT_MARKETS_URL.to_string(),
            tracked_currencies: TrackedCurrencies::default().codes().to_vec(),
            http_timeout_secs: 30,
            crypto_limit: 10,
        }
    }
}

impl AppConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tracked_currencies.is_empty() {
            return Err(ConfigError::Invalid(
                "tracked_currencies must name at least one currency".into(),
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn tracked(&self) -> TrackedCurrencies {
        let mut codes: Vec<CurrencyCode> = Vec::with_capacity(self.tracked_currencies.len());
        for code in &self.tracked_currencies {
            if !codes.contains(code) {
                codes.push(code.clone());
            }
        }
        TrackedCurrencies::new(codes)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
