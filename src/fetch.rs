use anyhow::{Context, Result};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::models::{JobListing, RawListing};

pub const DEFAULT_ENDPOINT: &str = "https://api-pourhakimi.vercel.app/";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Network(#[source] reqwest::Error),

    #[error("unexpected response shape: {0}")]
    Format(String),
}

/// Fetches the listing set from the remote endpoint.
///
/// The search query is never transmitted; every fetch returns the full
/// fixed set the endpoint serves.
pub struct ResultFetcher {
    client: reqwest::Client,
    endpoint: String,
}

impl ResultFetcher {
    pub fn new(endpoint: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// One GET, full body, decode, map. No retries, no caching.
    pub async fn fetch(&self) -> std::result::Result<Vec<JobListing>, FetchError> {
        debug!(endpoint = %self.endpoint, "fetching listings");

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(FetchError::Network)?
            .error_for_status()
            .map_err(FetchError::Network)?;

        let body = response.text().await.map_err(FetchError::Network)?;
        let listings = parse_listings(&body)?;

        debug!(count = listings.len(), "fetch settled");
        Ok(listings)
    }
}

/// Decodes a response body into listings.
///
/// The whole fetch fails if any element is malformed; the error names the
/// offending element index.
pub fn parse_listings(body: &str) -> std::result::Result<Vec<JobListing>, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| FetchError::Format(format!("body is not JSON: {e}")))?;

    let data = value
        .get("data")
        .and_then(|d| d.as_array())
        .ok_or_else(|| FetchError::Format("missing `data` array".to_string()))?;

    let mut listings = Vec::with_capacity(data.len());
    for (index, element) in data.iter().enumerate() {
        let raw: RawListing = serde_json::from_value(element.clone())
            .map_err(|e| FetchError::Format(format!("listing {index}: {e}")))?;
        listings.push(JobListing::from(raw));
    }

    Ok(listings)
}
