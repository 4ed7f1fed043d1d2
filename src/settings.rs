//! Runtime settings from the process environment (after `.env` is loaded).

use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/countries";
pub const DEFAULT_SOURCE_URL: &str = "https://restcountries.com/v3.1/all";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    /// Schema holding the `countries` table.
    pub schema: String,
    pub bind_addr: String,
    pub source_url: String,
    pub fetch_timeout: Duration,
    pub sync_timeout: Duration,
    /// Periodic sync while serving; `None` disables it.
    pub sync_interval: Option<Duration>,
    pub admin_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.into(),
            schema: "public".into(),
            bind_addr: DEFAULT_BIND_ADDR.into(),
            source_url: DEFAULT_SOURCE_URL.into(),
            fetch_timeout: Duration::from_secs(30),
            sync_timeout: Duration::from_secs(300),
            sync_interval: None,
            admin_token: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();
        Ok(Settings {
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            schema: get("COUNTRY_SCHEMA").unwrap_or(defaults.schema),
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            source_url: get("COUNTRIES_SOURCE_URL").unwrap_or(defaults.source_url),
            fetch_timeout: secs("FETCH_TIMEOUT_SECS", get("FETCH_TIMEOUT_SECS"))?
                .unwrap_or(defaults.fetch_timeout),
            sync_timeout: secs("SYNC_TIMEOUT_SECS", get("SYNC_TIMEOUT_SECS"))?
                .unwrap_or(defaults.sync_timeout),
            sync_interval: secs("SYNC_INTERVAL_SECS", get("SYNC_INTERVAL_SECS"))?,
            admin_token: get("ADMIN_TOKEN"),
        })
    }
}

fn secs(key: &'static str, raw: Option<String>) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = raw else { return Ok(None) };
    match raw.parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(Duration::from_secs(n))),
        _ => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}
