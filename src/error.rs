//! Error types for the download pipeline.
//!
//! Fetch errors are local to a single tile; whether they abort a whole
//! panorama download or are absorbed depends on the execution mode and
//! the configured [`FailurePolicy`](crate::config::FailurePolicy).

use crate::grid::GridError;
use thiserror::Error;

/// Errors that can occur while fetching a single tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FetchError {
    /// Recoverable transport failure (connection refused, timeout,
    /// HTTP error status). Consumed by the retry loop; callers only see
    /// it through [`FetchError::MaxRetriesExceeded`] once the retry
    /// budget is spent, or directly when calling a client by hand.
    #[error("connection error: {0}")]
    Transient(String),

    /// The retry budget for one tile is exhausted.
    #[error("max retries exceeded for tile ({x}, {y}) after {attempts} attempts: {url}")]
    MaxRetriesExceeded {
        x: u32,
        y: u32,
        url: String,
        attempts: u32,
    },

    /// The response body could not be parsed as an image. Never retried:
    /// the tile service answers out-of-range coordinates with a
    /// well-formed placeholder image, so an undecodable body means the
    /// response itself is broken, not that the tile is missing.
    #[error("image decode failed for tile ({x}, {y}): {message}")]
    Decode { x: u32, y: u32, message: String },
}

/// Errors from a whole-panorama download.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DownloadError {
    /// The tile grid could not be constructed (bad zoom level). Raised
    /// before any network call is made.
    #[error("tile grid error: {0}")]
    Grid(#[from] GridError),

    /// A tile fetch failed and the execution mode propagates failures.
    #[error("tile fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
