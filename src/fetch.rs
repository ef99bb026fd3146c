//! Tile retrieval with bounded retry.
//!
//! [`TileFetcher`] (blocking) and [`AsyncTileFetcher`] (cooperative)
//! implement the same contract: request one tile, retrying transient
//! transport failures up to the configured budget with a fixed pause
//! between attempts, then decode the body into a [`Tile`].
//!
//! Decode failures are terminal for the tile and are never retried. The
//! service responds to out-of-range grid coordinates with a small
//! well-formed placeholder image, so a successfully received body is
//! always expected to decode; callers probe past the grid edge on
//! purpose and rely on the placeholder coming back as ordinary data.

use crate::client::{AsyncTileClient, TileClient};
use crate::config::DownloadConfig;
use crate::error::FetchError;
use crate::grid::TileAddress;
use image::RgbImage;
use tracing::{debug, warn};

/// One fetched tile: grid position plus decoded pixel data.
///
/// Produced by a successful fetch and consumed exactly once by the
/// assembler, which copies the pixels onto the canvas.
#[derive(Debug, Clone)]
pub struct Tile {
    /// Column index within the grid
    pub x: u32,
    /// Row index within the grid
    pub y: u32,
    /// Decoded pixel data
    pub image: RgbImage,
}

/// Blocking tile fetcher.
///
/// Owns its transport client for the lifetime of a pipeline run; cloning
/// the fetcher (for the worker pool) clones the client, which for
/// [`ReqwestTileClient`](crate::client::ReqwestTileClient) shares the
/// underlying connection pool.
#[derive(Clone)]
pub struct TileFetcher<C> {
    client: C,
    config: DownloadConfig,
}

impl<C: TileClient> TileFetcher<C> {
    /// Creates a fetcher from a transport client and configuration.
    pub fn new(client: C, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    /// Returns the fetcher's configuration.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Fetches and decodes one tile, blocking through the retry loop.
    ///
    /// # Errors
    ///
    /// [`FetchError::MaxRetriesExceeded`] when every attempt failed with
    /// a transient transport error, or [`FetchError::Decode`] when a
    /// received body is not an image.
    pub fn fetch(&self, address: &TileAddress) -> Result<Tile, FetchError> {
        let max_retries = self.config.max_retries();

        for attempt in 1..=max_retries {
            match self.client.get(&address.url) {
                Ok(body) => return decode_tile(address, &body),
                Err(FetchError::Transient(message)) => {
                    warn!(
                        x = address.x,
                        y = address.y,
                        attempt = attempt,
                        max_retries = max_retries,
                        error = %message,
                        "tile fetch attempt failed"
                    );
                    if attempt < max_retries {
                        std::thread::sleep(self.config.retry_backoff());
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Err(max_retries_error(address, max_retries))
    }
}

/// Cooperative tile fetcher.
///
/// Identical contract to [`TileFetcher`], but the network wait and the
/// retry backoff are suspension points that yield to the runtime instead
/// of blocking a thread.
#[derive(Clone)]
pub struct AsyncTileFetcher<C> {
    client: C,
    config: DownloadConfig,
}

impl<C: AsyncTileClient> AsyncTileFetcher<C> {
    /// Creates a fetcher from an async transport client and configuration.
    pub fn new(client: C, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    /// Returns the fetcher's configuration.
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Fetches and decodes one tile, suspending through the retry loop.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`TileFetcher::fetch`].
    pub async fn fetch(&self, address: &TileAddress) -> Result<Tile, FetchError> {
        let max_retries = self.config.max_retries();

        for attempt in 1..=max_retries {
            match self.client.get(&address.url).await {
                Ok(body) => return decode_tile(address, &body),
                Err(FetchError::Transient(message)) => {
                    warn!(
                        x = address.x,
                        y = address.y,
                        attempt = attempt,
                        max_retries = max_retries,
                        error = %message,
                        "tile fetch attempt failed"
                    );
                    if attempt < max_retries {
                        tokio::time::sleep(self.config.retry_backoff()).await;
                    }
                }
                Err(other) => return Err(other),
            }
        }

        Err(max_retries_error(address, max_retries))
    }
}

/// Decodes a response body into a [`Tile`] for the given address.
fn decode_tile(address: &TileAddress, body: &[u8]) -> Result<Tile, FetchError> {
    let image = image::load_from_memory(body)
        .map_err(|e| FetchError::Decode {
            x: address.x,
            y: address.y,
            message: e.to_string(),
        })?
        .to_rgb8();

    debug!(
        x = address.x,
        y = address.y,
        width = image.width(),
        height = image.height(),
        "tile decoded"
    );

    Ok(Tile {
        x: address.x,
        y: address.y,
        image,
    })
}

fn max_retries_error(address: &TileAddress, attempts: u32) -> FetchError {
    warn!(
        x = address.x,
        y = address.y,
        attempts = attempts,
        "tile fetch retries exhausted"
    );
    FetchError::MaxRetriesExceeded {
        x: address.x,
        y: address.y,
        url: address.url.clone(),
        attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{MockAsyncTileClient, MockTileClient};
    use image::{DynamicImage, ImageFormat, Rgb};
    use std::io::Cursor;
    use std::time::{Duration, Instant};

    fn test_jpeg(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([120, 90, 60]));
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut bytes, ImageFormat::Jpeg)
            .unwrap();
        bytes.into_inner()
    }

    fn test_address() -> TileAddress {
        TileAddress::new("pano", 2, 3, 1)
    }

    fn fast_config(max_retries: u32) -> DownloadConfig {
        DownloadConfig::new()
            .with_max_retries(max_retries)
            .with_retry_backoff(Duration::ZERO)
    }

    #[test]
    fn test_fetch_decodes_tile() {
        let client = MockTileClient::always(Ok(test_jpeg(16, 16)));
        let fetcher = TileFetcher::new(client.clone(), fast_config(3));

        let tile = fetcher.fetch(&test_address()).unwrap();
        assert_eq!(tile.x, 3);
        assert_eq!(tile.y, 1);
        assert_eq!(tile.image.dimensions(), (16, 16));
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_fetch_retries_transient_then_succeeds() {
        let client = MockTileClient::scripted(
            vec![
                Err(FetchError::Transient("reset".to_string())),
                Err(FetchError::Transient("reset".to_string())),
            ],
            Ok(test_jpeg(8, 8)),
        );
        let fetcher = TileFetcher::new(client.clone(), fast_config(3));

        let tile = fetcher.fetch(&test_address()).unwrap();
        assert_eq!(tile.image.dimensions(), (8, 8));
        assert_eq!(client.calls(), 3);
    }

    #[test]
    fn test_fetch_exhausts_retries() {
        let client = MockTileClient::always(Err(FetchError::Transient("reset".to_string())));
        let fetcher = TileFetcher::new(client.clone(), fast_config(4));

        let err = fetcher.fetch(&test_address()).unwrap_err();
        match err {
            FetchError::MaxRetriesExceeded {
                x,
                y,
                url,
                attempts,
            } => {
                assert_eq!((x, y), (3, 1));
                assert_eq!(url, test_address().url);
                assert_eq!(attempts, 4);
            }
            other => panic!("expected MaxRetriesExceeded, got {:?}", other),
        }
        assert_eq!(client.calls(), 4);
    }

    #[test]
    fn test_fetch_does_not_retry_decode_failure() {
        let client = MockTileClient::always(Ok(vec![0xde, 0xad, 0xbe, 0xef]));
        let fetcher = TileFetcher::new(client.clone(), fast_config(6));

        let err = fetcher.fetch(&test_address()).unwrap_err();
        assert!(matches!(err, FetchError::Decode { x: 3, y: 1, .. }));
        assert_eq!(client.calls(), 1);
    }

    #[test]
    fn test_fetch_zero_retries_fails_without_request() {
        let client = MockTileClient::always(Ok(test_jpeg(8, 8)));
        let fetcher = TileFetcher::new(client.clone(), fast_config(0));

        let err = fetcher.fetch(&test_address()).unwrap_err();
        assert!(matches!(
            err,
            FetchError::MaxRetriesExceeded { attempts: 0, .. }
        ));
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn test_fetch_waits_backoff_between_attempts() {
        let client = MockTileClient::always(Err(FetchError::Transient("reset".to_string())));
        let config = DownloadConfig::new()
            .with_max_retries(3)
            .with_retry_backoff(Duration::from_millis(20));
        let fetcher = TileFetcher::new(client, config);

        let start = Instant::now();
        let _ = fetcher.fetch(&test_address());
        // Two pauses between three attempts; none after the last
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_async_fetch_decodes_tile() {
        let client = MockAsyncTileClient::always(Ok(test_jpeg(16, 16)));
        let fetcher = AsyncTileFetcher::new(client.clone(), fast_config(3));

        let tile = fetcher.fetch(&test_address()).await.unwrap();
        assert_eq!((tile.x, tile.y), (3, 1));
        assert_eq!(tile.image.dimensions(), (16, 16));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_async_fetch_retries_then_succeeds() {
        let client = MockAsyncTileClient::scripted(
            vec![Err(FetchError::Transient("reset".to_string()))],
            Ok(test_jpeg(8, 8)),
        );
        let fetcher = AsyncTileFetcher::new(client.clone(), fast_config(2));

        assert!(fetcher.fetch(&test_address()).await.is_ok());
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_async_fetch_exhausts_retries() {
        let client = MockAsyncTileClient::always(Err(FetchError::Transient("reset".to_string())));
        let fetcher = AsyncTileFetcher::new(client.clone(), fast_config(2));

        let err = fetcher.fetch(&test_address()).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::MaxRetriesExceeded { attempts: 2, .. }
        ));
        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_async_fetch_does_not_retry_decode_failure() {
        let client = MockAsyncTileClient::always(Ok(vec![1, 2, 3]));
        let fetcher = AsyncTileFetcher::new(client.clone(), fast_config(6));

        let err = fetcher.fetch(&test_address()).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
        assert_eq!(client.calls(), 1);
    }
}
