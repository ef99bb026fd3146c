//! Download configuration.

use std::time::Duration;

/// Default number of fetch attempts per tile.
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// Default pause between fetch attempts for one tile.
///
/// Fixed, with no exponential growth and no jitter: the tile service
/// rate-limits aggressively, and more eager retry schedules were observed
/// to increase the chance of getting banned outright.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);

/// Upper bound on the worker pool regardless of core count.
const MAX_DEFAULT_PARALLEL_FETCHES: usize = 64;

/// How the thread-parallel mode reacts to a tile that failed after all
/// retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Surface the failure and abort the whole download, matching the
    /// sequential mode's behavior.
    #[default]
    Abort,
    /// Log the failure and continue; the canvas region for a skipped
    /// tile keeps its initial black fill.
    Skip,
}

/// Configuration for panorama downloading.
///
/// Groups the retry, concurrency, and failure-handling parameters shared
/// by all execution modes, providing sensible defaults while allowing
/// customization.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use panostitch::config::{DownloadConfig, FailurePolicy};
///
/// // Using defaults
/// let config = DownloadConfig::default();
/// assert_eq!(config.max_retries(), 6);
/// assert_eq!(config.retry_backoff(), Duration::from_secs(2));
/// assert_eq!(config.failure_policy(), FailurePolicy::Abort);
///
/// // Custom configuration
/// let config = DownloadConfig::new()
///     .with_max_retries(3)
///     .with_retry_backoff(Duration::from_secs(5))
///     .with_parallel_fetches(16)
///     .with_failure_policy(FailurePolicy::Skip);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Number of fetch attempts per tile before giving up
    max_retries: u32,
    /// Pause between attempts for one tile
    retry_backoff: Duration,
    /// Maximum number of concurrent fetches in thread-parallel mode
    parallel_fetches: usize,
    /// Reaction to a tile lost after all retries (thread-parallel mode)
    failure_policy: FailurePolicy,
}

impl DownloadConfig {
    /// Create a new download configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of fetch attempts per tile.
    ///
    /// A tile is requested up to this many times before the fetch fails
    /// with a max-retries error. Default: 6 attempts.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the pause between fetch attempts.
    ///
    /// Applied after every failed attempt except the last. The interval
    /// is fixed; see [`DEFAULT_RETRY_BACKOFF`] for why there is no
    /// exponential growth. Default: 2 seconds.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Set the maximum number of concurrent fetches.
    ///
    /// Controls the worker-pool size used by the thread-parallel mode.
    /// A zoom 7 panorama has 8192 tiles, so an uncapped pool can
    /// overwhelm both the local machine and the remote service.
    /// Default: four workers per available core, capped at 64.
    pub fn with_parallel_fetches(mut self, parallel: usize) -> Self {
        self.parallel_fetches = parallel;
        self
    }

    /// Set the reaction to a tile that failed after all retries.
    ///
    /// Only consulted by the thread-parallel mode; the sequential and
    /// async modes always abort. Default: [`FailurePolicy::Abort`].
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Get the number of fetch attempts per tile.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Get the pause between fetch attempts.
    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Get the maximum number of concurrent fetches.
    pub fn parallel_fetches(&self) -> usize {
        self.parallel_fetches
    }

    /// Get the failure policy for the thread-parallel mode.
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            parallel_fetches: default_parallel_fetches(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Derives the default worker-pool size from the machine's core count.
fn default_parallel_fetches() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores * 4).min(MAX_DEFAULT_PARALLEL_FETCHES)
}
