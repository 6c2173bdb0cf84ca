//! HTTP client abstraction for testability.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, trace};

use super::types::ProviderError;

/// Default client-side request timeout in seconds.
///
/// Slightly above the server-side Overpass timeout so the server gets
/// the first chance to report its own timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for asynchronous HTTP operations.
///
/// This abstraction allows dependency injection and easier testing by
/// enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP POST with a form-encoded body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `params` - Form fields as (name, value) pairs
    ///
    /// # Returns
    ///
    /// The response body as bytes, or an error on transport failure or
    /// non-success status.
    fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new client with the default timeout.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom timeout in seconds.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Http(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<u8>, ProviderError> {
        trace!(url = url, "HTTP POST starting");

        let response = self
            .client
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(url = url, status = status.as_u16(), "HTTP response received");

        if !status.is_success() {
            return Err(ProviderError::Http(format!("HTTP {} from {}", status, url)));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| ProviderError::Http(format!("Failed to read response: {}", e)))
    }
}
