//! HTTP client abstraction for testability.
//!
//! The fetch pipeline talks to the tile service through the [`TileClient`]
//! and [`AsyncTileClient`] traits so that tests can substitute mock
//! transports. Real transports are provided by [`ReqwestTileClient`]
//! (blocking, used by the sequential and worker-pool modes) and
//! [`AsyncReqwestTileClient`] (non-blocking, used by the async mode).
//!
//! Transport failures are reported as [`FetchError::Transient`]: the tile
//! service signals out-of-range coordinates with a placeholder image body
//! rather than an error status, so a failed request means infrastructure
//! trouble (connection reset, timeout, rate limiting), which is exactly
//! what the retry loop exists for.

use crate::error::FetchError;
use std::future::Future;

/// Default User-Agent string for HTTP requests.
/// The tile service rejects requests without a browser-like User-Agent.
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Per-request timeout for tile fetches.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for synchronous tile transport.
///
/// Used by the sequential and thread-parallel execution modes, which
/// block a thread for the duration of each request.
pub trait TileClient: Send + Sync {
    /// Performs an HTTP GET request for one tile.
    ///
    /// # Arguments
    ///
    /// * `url` - The tile URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes, or [`FetchError::Transient`] on any
    /// transport or HTTP-status failure.
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Trait for asynchronous tile transport.
///
/// Used by the cooperative execution mode; the request is a suspension
/// point rather than a blocking call.
pub trait AsyncTileClient: Send + Sync {
    /// Performs an async HTTP GET request for one tile.
    ///
    /// # Arguments
    ///
    /// * `url` - The tile URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes, or [`FetchError::Transient`] on any
    /// transport or HTTP-status failure.
    fn get(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Blocking HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestTileClient {
    client: reqwest::blocking::Client,
}

impl ReqwestTileClient {
    /// Creates a new client with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transient(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl TileClient for ReqwestTileClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchError::Transient(format!("Request failed for {}: {}", url, e)))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(FetchError::Transient(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        // Read response body
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transient(format!("Failed to read response: {}", e)))
    }
}

/// Async HTTP client implementation using reqwest.
///
/// Owns a pooled connection set that is shared by every clone; the pool
/// is created when the client is built and released when the last clone
/// is dropped. This is the process-wide connection resource for a
/// pipeline run, passed by handle instead of living in global state.
#[derive(Clone)]
pub struct AsyncReqwestTileClient {
    client: reqwest::Client,
}

impl AsyncReqwestTileClient {
    /// Creates a new async client with default configuration.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a new async client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            // Connection pooling - keep connections warm across sequential tile fetches
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            // TCP optimizations
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                FetchError::Transient(format!("Failed to create async HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncTileClient for AsyncReqwestTileClient {
    async fn get(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("Request failed for {}: {}", url, e)))?;

        // Check HTTP status
        if !response.status().is_success() {
            return Err(FetchError::Transient(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        // Read response body
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transient(format!("Failed to read response: {}", e)))
    }
}
