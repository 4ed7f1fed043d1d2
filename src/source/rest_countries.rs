//! HTTP client for the REST Countries v3.1 `all` endpoint.

use super::{parse_snapshot, CountrySource, RawCountry};
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;

/// Fields requested from the source; the endpoint rejects `all` without a field list.
pub const SNAPSHOT_FIELDS: &str =
    "name,region,subregion,demonyms,population,independent,cca3,flags,currencies";

#[derive(Clone)]
pub struct RestCountriesClient {
    client: reqwest::Client,
    url: String,
}

impl RestCountriesClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(RestCountriesClient {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CountrySource for RestCountriesClient {
    async fn fetch_snapshot(&self) -> Result<Vec<RawCountry>, FetchError> {
        tracing::debug!(url = %self.url, "fetching country snapshot");
        let response = self
            .client
            .get(&self.url)
            .query(&[("fields", SNAPSHOT_FIELDS)])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.bytes().await?;
        parse_snapshot(&body)
    }
}
