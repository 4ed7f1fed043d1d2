//! External country dataset: the raw snapshot shape and the source abstraction.

mod rest_countries;

pub use rest_countries::{RestCountriesClient, SNAPSHOT_FIELDS};

use crate::error::FetchError;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// One record of the snapshot, kept as sent. Field types are checked by `decode`, so a
/// malformed record fails on its own instead of failing the whole body.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawCountry(pub Value);

impl RawCountry {
    /// `cca3` when it is a non-blank string.
    pub fn code(&self) -> Option<&str> {
        self.0
            .get("cca3")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    pub fn decode(&self) -> Result<CountryRecord, serde_json::Error> {
        CountryRecord::deserialize(&self.0)
    }
}

/// Typed view of one record. Every field is optional here;
/// required fields are enforced when the record is transformed into a country.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CountryRecord {
    #[serde(default)]
    pub name: Option<RawName>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub subregion: Option<String>,
    /// language -> gender (`f`/`m`) -> demonym
    #[serde(default)]
    pub demonyms: Option<HashMap<String, HashMap<String, String>>>,
    #[serde(default)]
    pub population: Option<i64>,
    #[serde(default)]
    pub independent: Option<bool>,
    #[serde(default)]
    pub cca3: Option<String>,
    #[serde(default)]
    pub flags: Option<RawFlags>,
    /// Keyed by currency code; the BTreeMap keeps them sorted by code.
    #[serde(default)]
    pub currencies: Option<BTreeMap<String, RawCurrency>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawName {
    #[serde(default)]
    pub common: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawFlags {
    #[serde(default)]
    pub png: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawCurrency {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Provider of full snapshots. Implementations do not retry.
#[async_trait]
pub trait CountrySource: Send + Sync {
    async fn fetch_snapshot(&self) -> Result<Vec<RawCountry>, FetchError>;
}

/// Decode a snapshot body. Only the outer JSON array is checked here.
pub fn parse_snapshot(body: &[u8]) -> Result<Vec<RawCountry>, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}
