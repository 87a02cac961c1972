//! Hosted task store configuration.
//!
//! # Responsibility
//! - Describe how to reach the hosted persistence service.
//! - Load settings from the process environment with validation.
//!
//! # Invariants
//! - A constructed `StoreConfig` always passes `validate()`.
//! - The API key never appears in `Debug` output or logs.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::time::Duration;

pub const ENV_STORE_URL: &str = "TASKMINDER_STORE_URL";
pub const ENV_STORE_KEY: &str = "TASKMINDER_STORE_KEY";
pub const ENV_STORE_TABLE: &str = "TASKMINDER_STORE_TABLE";
pub const ENV_STORE_TIMEOUT_SECS: &str = "TASKMINDER_STORE_TIMEOUT_SECS";

const DEFAULT_TABLE: &str = "tasks";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]*$").expect("valid table name regex"));

/// Configuration errors for the hosted store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    InvalidUrl(String),
    EmptyApiKey,
    InvalidTable(String),
    InvalidTimeout(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "missing required setting `{name}`"),
            Self::InvalidUrl(value) => {
                write!(f, "store url must start with http:// or https://, got `{value}`")
            }
            Self::EmptyApiKey => write!(f, "store api key must not be empty"),
            Self::InvalidTable(value) => write!(
                f,
                "table name `{value}` is invalid; expected lowercase letters, digits or `_`"
            ),
            Self::InvalidTimeout(value) => {
                write!(f, "timeout must be a positive number of seconds, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {}

/// Connection settings for the hosted task store.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    base_url: String,
    api_key: String,
    table: String,
    timeout: Duration,
}

impl StoreConfig {
    /// Creates a config with the default table and timeout.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            base_url: base_url.into().trim().trim_end_matches('/').to_string(),
            api_key: api_key.into().trim().to_string(),
            table: DEFAULT_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Result<Self, ConfigError> {
        self.table = table.into().trim().to_string();
        self.validate()?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ConfigError> {
        self.timeout = timeout;
        self.validate()?;
        Ok(self)
    }

    /// Loads config from `TASKMINDER_STORE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads config through an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let base_url = get(ENV_STORE_URL).ok_or(ConfigError::Missing(ENV_STORE_URL))?;
        let api_key = get(ENV_STORE_KEY).ok_or(ConfigError::Missing(ENV_STORE_KEY))?;
        let mut config = Self::new(base_url, api_key)?;

        if let Some(table) = get(ENV_STORE_TABLE) {
            config = config.with_table(table)?;
        }
        if let Some(raw) = get(ENV_STORE_TIMEOUT_SECS) {
            let seconds = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config = config.with_timeout(Duration::from_secs(seconds))?;
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        if !TABLE_NAME_RE.is_match(&self.table) {
            return Err(ConfigError::InvalidTable(self.table.clone()));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(format!("{:?}", self.timeout)));
        }
        Ok(())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Collection endpoint, e.g. `https://host/rest/v1/tasks`.
    pub fn collection_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .field("timeout", &self.timeout)
            .finish()
    }
}
