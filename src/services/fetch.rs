//! Remote image retrieval

use crate::error::{BgRemovalError, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// HTTP client for downloading images by URL
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a fetcher whose requests give up after `timeout`
    ///
    /// # Errors
    /// - Failed to create HTTP client
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BgRemovalError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Download the body at `url`
    ///
    /// # Errors
    /// - Invalid URL, connection failure or timeout
    /// - Non-success HTTP status
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "Fetching remote image");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BgRemovalError::network_error(&e))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BgRemovalError::network_error(&e))?;

        debug!(url, bytes = bytes.len(), "Remote image fetched");
        Ok(bytes.to_vec())
    }
}
