//! Typed run configuration from environment variables or a TOML file.
//!
//! Loads once at startup and fails fast on malformed values. The API token is
//! wrapped in `secrecy::SecretString` so it never shows up in logs.

use crate::engine::EngineConfig;
use crate::error::{Error, Result};
use crate::fetch::http::DEFAULT_BASE_URL;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Identifiers fetched by a default run (`1..=4500`).
pub const DEFAULT_TOTAL: u64 = 4500;

#[derive(Debug)]
pub struct Config {
    pub base_url: String,
    /// Number of sequential identifiers to fetch.
    pub total: u64,
    pub retry_limit: u32,
    pub attempt_timeout: Duration,
    pub concurrency: usize,
    pub api_token: Option<SecretString>,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            total: DEFAULT_TOTAL,
            retry_limit: engine.retry_limit,
            attempt_timeout: engine.attempt_timeout,
            concurrency: engine.concurrency,
            api_token: None,
            otel_endpoint: None,
            log_level: "info".to_string(),
        }
    }
}

/// On-disk shape. Every key is optional and falls back to the default.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    total: Option<u64>,
    retry_limit: Option<u32>,
    timeout_ms: Option<u64>,
    concurrency: Option<usize>,
    api_token: Option<String>,
    otel_endpoint: Option<String>,
    log_level: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            base_url: std::env::var("FETCH_BASE_URL").unwrap_or(defaults.base_url),
            total: parsed_var("FETCH_TOTAL")?.unwrap_or(defaults.total),
            retry_limit: parsed_var("FETCH_RETRY_LIMIT")?.unwrap_or(defaults.retry_limit),
            attempt_timeout: parsed_var("FETCH_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_timeout),
            concurrency: parsed_var("FETCH_CONCURRENCY")?.unwrap_or(defaults.concurrency),
            api_token: std::env::var("FETCH_API_TOKEN").ok().map(SecretString::from),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };
        config.validate()
    }

    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("bad config file {}: {e}", path.display())))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        let defaults = Self::default();
        let config = Self {
            base_url: file.base_url.unwrap_or(defaults.base_url),
            total: file.total.unwrap_or(defaults.total),
            retry_limit: file.retry_limit.unwrap_or(defaults.retry_limit),
            attempt_timeout: file
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.attempt_timeout),
            concurrency: file.concurrency.unwrap_or(defaults.concurrency),
            api_token: file.api_token.map(SecretString::from),
            otel_endpoint: file.otel_endpoint,
            log_level: file.log_level.unwrap_or(defaults.log_level),
        };
        config.validate()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            retry_limit: self.retry_limit,
            attempt_timeout: self.attempt_timeout,
            concurrency: self.concurrency,
        }
    }

    fn validate(self) -> Result<Self> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.attempt_timeout.is_zero() {
            return Err(Error::Config("attempt timeout must be positive".to_string()));
        }
        if self.base_url.is_empty() {
            return Err(Error::Config("base url must not be empty".to_string()));
        }
        Ok(self)
    }
}

fn parsed_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::Config(format!("invalid {name}={raw:?}: {e}"))),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::Config(format!("invalid {name}: {e}"))),
    }
}
