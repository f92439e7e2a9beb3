//! HTTP retrieval of registry documents
//!
//! [`RegistryFetcher`] is the seam between the aggregation service and the
//! network. [`HttpRegistryFetcher`] performs a single `GET` with
//! `Accept: application/json` and a bounded timeout; it never retries and
//! never caches. Bodies that are not JSON count as transport failures, JSON
//! of the wrong shape as a malformed document.

use super::document::RawRegistryDocument;
use super::error::RegistryError;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::error::Category;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Default request timeout for registry calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Source of raw registry documents
#[async_trait]
pub trait RegistryFetcher: Send + Sync {
    /// Retrieves and decodes the registry document served at `url`
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] on network failure, timeout,
    /// non-2xx status, or a body that is not JSON, and
    /// [`RegistryError::MalformedDocument`] for JSON of the wrong shape.
    async fn fetch(&self, url: &str) -> Result<RawRegistryDocument, RegistryError>;

    /// Returns the name of this fetcher
    fn name(&self) -> &str;
}

/// Fetcher backed by a pooled `reqwest` client
///
/// This client is thread-safe and can be shared across tasks using `Arc`.
pub struct HttpRegistryFetcher {
    /// Shared HTTP client with connection pooling
    http_client: Client,

    /// Request timeout duration
    timeout: Duration,
}

impl HttpRegistryFetcher {
    /// Creates a fetcher with the default timeout
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a fetcher with a custom timeout
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Transport`] if the TLS backend cannot be
    /// initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, RegistryError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegistryError::transport("<client>", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            timeout,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl RegistryFetcher for HttpRegistryFetcher {
    async fn fetch(&self, url: &str) -> Result<RawRegistryDocument, RegistryError> {
        debug!("Requesting registry document from {}", url);

        let start = Instant::now();

        let response = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Registry request timed out after {:?}", self.timeout);
                    RegistryError::transport(
                        url,
                        format!("timed out after {} seconds", self.timeout.as_secs()),
                    )
                } else if e.is_connect() {
                    error!("Cannot connect to registry at {}", url);
                    RegistryError::transport(url, format!("Connection failed: {}", e))
                } else {
                    error!("Registry request error: {}", e);
                    RegistryError::transport(url, format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Registry returned error status {}: {}", status, body);
            return Err(RegistryError::transport(
                url,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let body = response.text().await.map_err(|e| {
            error!("Failed to read registry response body: {}", e);
            RegistryError::transport(url, format!("Failed to read body: {}", e))
        })?;

        let document =
            RawRegistryDocument::from_json(&body).map_err(|e| decode_error(url, e))?;

        info!(
            applications = document.applications().len(),
            "Registry document fetched in {:.2}s from {}",
            start.elapsed().as_secs_f64(),
            url
        );

        Ok(document)
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Maps a decode failure: unreadable JSON is a transport problem, valid JSON
/// of the wrong shape is a malformed document
fn decode_error(url: &str, e: serde_json::Error) -> RegistryError {
    match e.classify() {
        Category::Data => {
            error!("Registry document from {} has an unexpected shape: {}", url, e);
            RegistryError::malformed(format!("unexpected document shape: {}", e))
        }
        _ => {
            error!("Failed to parse registry response: {}", e);
            RegistryError::transport(url, format!("JSON parse error: {}", e))
        }
    }
}

impl fmt::Debug for HttpRegistryFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRegistryFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}
