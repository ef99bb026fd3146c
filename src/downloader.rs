//! High-level panorama download facade.
//!
//! [`PanoramaDownloader`] and [`AsyncPanoramaDownloader`] wire the
//! address grid, fetcher, tile stream, and assembler together behind the
//! surface most callers want: hand over a panorama id and a zoom level,
//! get back the stitched canvas. The raw tile streams remain reachable
//! through the `tiles*` accessors for callers that consume tiles
//! themselves.

use crate::assemble::{assemble_panorama, assemble_panorama_stream};
use crate::client::{AsyncTileClient, TileClient};
use crate::config::DownloadConfig;
use crate::error::{DownloadError, FetchError};
use crate::fetch::{AsyncTileFetcher, Tile, TileFetcher};
use crate::grid::GridError;
use crate::stream::{tile_stream, ParallelTileStream, TileStream};
use futures::stream::Stream;
use image::RgbImage;
use tracing::info;

/// Zoom level that balances resolution against download size; a zoom 5
/// panorama is 32×16 tiles (16384×8192 pixels).
pub const DEFAULT_ZOOM: u8 = 5;

/// Downloads and assembles panoramas over a blocking transport.
///
/// Owns the HTTP client for the lifetime of the downloader; every
/// download made through one instance reuses the client's connection
/// pool.
///
/// # Example
///
/// ```ignore
/// use panostitch::client::ReqwestTileClient;
/// use panostitch::config::DownloadConfig;
/// use panostitch::downloader::{PanoramaDownloader, DEFAULT_ZOOM};
///
/// let client = ReqwestTileClient::new()?;
/// let downloader = PanoramaDownloader::new(client, DownloadConfig::default());
/// let panorama = downloader.download("z80QZ1_QgCbYwj7RrmlS0Q", DEFAULT_ZOOM)?;
/// ```
pub struct PanoramaDownloader<C> {
    fetcher: TileFetcher<C>,
}

impl<C: TileClient> PanoramaDownloader<C> {
    /// Creates a downloader from a transport client and configuration.
    pub fn new(client: C, config: DownloadConfig) -> Self {
        Self {
            fetcher: TileFetcher::new(client, config),
        }
    }

    /// Returns the downloader's configuration.
    pub fn config(&self) -> &DownloadConfig {
        self.fetcher.config()
    }

    /// Downloads a panorama sequentially, one tile fetch in flight at a
    /// time.
    ///
    /// The slowest mode, but also the gentlest on the tile service's
    /// rate limiting. The first tile that fails after all retries aborts
    /// the download.
    ///
    /// # Errors
    ///
    /// [`DownloadError::Grid`] for an invalid zoom level (before any
    /// network call), or [`DownloadError::Fetch`] for the first tile
    /// lost after all retries.
    pub fn download(&self, pano_id: &str, zoom: u8) -> Result<RgbImage, DownloadError> {
        info!(pano_id = pano_id, zoom = zoom, "downloading panorama");
        let tiles = TileStream::new(&self.fetcher, pano_id, zoom)?;
        assemble_panorama(zoom, tiles)
    }

    /// Downloads a panorama with the worker pool, tiles arriving in
    /// completion order.
    ///
    /// A lot faster than [`download`](Self::download), and a lot more
    /// likely to get the client rate limited. Reaction to a lost tile
    /// follows the configured
    /// [`FailurePolicy`](crate::config::FailurePolicy): abort the
    /// download, or leave that tile's canvas region black.
    ///
    /// # Errors
    ///
    /// [`DownloadError::Grid`] for an invalid zoom level, or
    /// [`DownloadError::Fetch`] under the abort policy for the first
    /// tile lost after all retries.
    pub fn download_parallel(&self, pano_id: &str, zoom: u8) -> Result<RgbImage, DownloadError>
    where
        C: Clone + Send + 'static,
    {
        info!(
            pano_id = pano_id,
            zoom = zoom,
            workers = self.fetcher.config().parallel_fetches(),
            "downloading panorama in parallel"
        );
        let tiles = ParallelTileStream::spawn(&self.fetcher, pano_id, zoom)?;
        assemble_panorama(zoom, tiles)
    }

    /// Returns the sequential tile stream without assembling it.
    pub fn tiles(&self, pano_id: &str, zoom: u8) -> Result<TileStream<'_, C>, GridError> {
        TileStream::new(&self.fetcher, pano_id, zoom)
    }

    /// Returns the worker-pool tile stream without assembling it.
    ///
    /// Fetching starts as soon as this returns; dropping the stream
    /// stops the workers after their in-flight fetches finish.
    pub fn tiles_parallel(
        &self,
        pano_id: &str,
        zoom: u8,
    ) -> Result<ParallelTileStream, GridError>
    where
        C: Clone + Send + 'static,
    {
        ParallelTileStream::spawn(&self.fetcher, pano_id, zoom)
    }
}

/// Downloads and assembles panoramas over an async transport.
///
/// Sequential semantics with cooperative waiting: one fetch in flight at
/// a time, and both the response wait and the retry backoff suspend the
/// task instead of blocking a thread.
pub struct AsyncPanoramaDownloader<C> {
    fetcher: AsyncTileFetcher<C>,
}

impl<C: AsyncTileClient> AsyncPanoramaDownloader<C> {
    /// Creates a downloader from an async transport client and
    /// configuration.
    pub fn new(client: C, config: DownloadConfig) -> Self {
        Self {
            fetcher: AsyncTileFetcher::new(client, config),
        }
    }

    /// Returns the downloader's configuration.
    pub fn config(&self) -> &DownloadConfig {
        self.fetcher.config()
    }

    /// Downloads a panorama, suspending through network waits and retry
    /// backoffs.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`PanoramaDownloader::download`].
    pub async fn download(&self, pano_id: &str, zoom: u8) -> Result<RgbImage, DownloadError> {
        info!(pano_id = pano_id, zoom = zoom, "downloading panorama");
        let tiles = tile_stream(&self.fetcher, pano_id, zoom)?;
        assemble_panorama_stream(zoom, tiles).await
    }

    /// Returns the async tile stream without assembling it.
    pub fn tiles(
        &self,
        pano_id: &str,
        zoom: u8,
    ) -> Result<impl Stream<Item = Result<Tile, FetchError>> + '_, GridError> {
        tile_stream(&self.fetcher, pano_id, zoom)
    }
}
