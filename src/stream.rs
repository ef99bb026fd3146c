//! Lazy tile streams.
//!
//! Three ways of driving the fetcher over a panorama's full address
//! grid, all single-pass:
//!
//! - [`TileStream`]: blocking iterator, one fetch in flight, tiles in
//!   enumeration order.
//! - [`ParallelTileStream`]: worker pool over a shared address queue,
//!   tiles in completion order.
//! - [`tile_stream`]: async stream with sequential semantics; the
//!   network wait and retry backoff suspend instead of blocking.
//!
//! ```text
//!   tile_addresses ──> [worker 0] ──┐
//!        (queue)  ──> [worker 1] ──┼──> mpsc ──> ParallelTileStream
//!                 ──> [worker n] ──┘            (completion order)
//! ```

use crate::client::{AsyncTileClient, TileClient};
use crate::config::FailurePolicy;
use crate::error::FetchError;
use crate::fetch::{AsyncTileFetcher, Tile, TileFetcher};
use crate::grid::{tile_addresses, GridError, TileAddress, TileAddresses};
use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use tracing::{debug, warn};

/// Sequential tile stream.
///
/// Yields one `Result<Tile, FetchError>` per grid address, in
/// column-major enumeration order, fetching lazily as elements are
/// pulled. Consumers that want the whole-download-abort behavior stop at
/// the first `Err`.
pub struct TileStream<'a, C> {
    fetcher: &'a TileFetcher<C>,
    addresses: TileAddresses,
}

impl<'a, C: TileClient> TileStream<'a, C> {
    /// Creates a stream over the full tile grid of a panorama.
    ///
    /// Fails fast on an invalid zoom level, before any network call.
    pub fn new(fetcher: &'a TileFetcher<C>, pano_id: &str, zoom: u8) -> Result<Self, GridError> {
        let addresses = tile_addresses(pano_id, zoom)?;
        Ok(Self { fetcher, addresses })
    }
}

impl<C: TileClient> Iterator for TileStream<'_, C> {
    type Item = Result<Tile, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        let address = self.addresses.next()?;
        Some(self.fetcher.fetch(&address))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.addresses.size_hint()
    }
}

impl<C: TileClient> ExactSizeIterator for TileStream<'_, C> {
    fn len(&self) -> usize {
        self.addresses.len()
    }
}

/// Thread-parallel tile stream.
///
/// Spawns a bounded worker pool that drains the address grid and yields
/// tiles in completion order. What happens to a tile that failed after
/// all retries depends on the configured
/// [`FailurePolicy`](crate::config::FailurePolicy):
///
/// - `Abort`: the first failure is yielded as `Err` and the stream ends.
///   Workers wind down as soon as their next send fails; fetches already
///   in flight are not interrupted.
/// - `Skip`: failures are logged and dropped; the stream yields one
///   `Ok` per surviving tile.
pub struct ParallelTileStream {
    results: Option<mpsc::Receiver<Result<Tile, FetchError>>>,
    failure_policy: FailurePolicy,
}

impl ParallelTileStream {
    /// Spawns the worker pool and returns the receiving stream.
    ///
    /// The pool size is the configured `parallel_fetches`, clamped to
    /// the number of tiles in the grid. Each worker clones the fetcher;
    /// reqwest-backed clients share one connection pool across clones.
    ///
    /// Fails fast on an invalid zoom level, before any thread is
    /// spawned.
    pub fn spawn<C>(
        fetcher: &TileFetcher<C>,
        pano_id: &str,
        zoom: u8,
    ) -> Result<Self, GridError>
    where
        C: TileClient + Clone + Send + 'static,
    {
        let addresses = tile_addresses(pano_id, zoom)?;
        let total = addresses.len();
        let workers = fetcher.config().parallel_fetches().clamp(1, total);
        let failure_policy = fetcher.config().failure_policy();

        debug!(
            pano_id = pano_id,
            zoom = zoom,
            tiles = total,
            workers = workers,
            "spawning parallel tile fetch"
        );

        let queue: Arc<Mutex<VecDeque<TileAddress>>> =
            Arc::new(Mutex::new(addresses.collect()));
        let (tx, rx) = mpsc::channel();

        for worker_id in 0..workers {
            let queue = Arc::clone(&queue);
            let tx = tx.clone();
            let fetcher = fetcher.clone();

            thread::Builder::new()
                .name(format!("tile-fetch-{}", worker_id))
                .spawn(move || {
                    loop {
                        let address = queue.lock().unwrap().pop_front();
                        let Some(address) = address else { break };

                        let result = fetcher.fetch(&address);
                        if tx.send(result).is_err() {
                            // Receiver gone; the download was aborted or dropped
                            break;
                        }
                    }
                })
                .expect("Failed to spawn tile fetch worker thread");
        }
        drop(tx);

        Ok(Self {
            results: Some(rx),
            failure_policy,
        })
    }
}

impl Iterator for ParallelTileStream {
    type Item = Result<Tile, FetchError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let received = match self.results.as_ref() {
                Some(rx) => rx.recv(),
                None => return None,
            };

            match received {
                Ok(Ok(tile)) => return Some(Ok(tile)),
                Ok(Err(error)) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        // Closing the channel tells the workers to stop
                        self.results = None;
                        return Some(Err(error));
                    }
                    FailurePolicy::Skip => {
                        warn!(error = %error, "skipping failed tile");
                    }
                },
                Err(_) => {
                    // Every worker has finished and dropped its sender
                    self.results = None;
                    return None;
                }
            }
        }
    }
}

/// Returns an async stream over the full tile grid of a panorama.
///
/// Logically identical to [`TileStream`]: one fetch in flight at a time,
/// tiles in enumeration order, first failure surfaced as `Err`. The
/// difference is that waiting suspends the task instead of blocking the
/// thread.
///
/// Fails fast on an invalid zoom level, before any network call.
pub fn tile_stream<'a, C: AsyncTileClient>(
    fetcher: &'a AsyncTileFetcher<C>,
    pano_id: &str,
    zoom: u8,
) -> Result<impl Stream<Item = Result<Tile, FetchError>> + 'a, GridError> {
    let addresses = tile_addresses(pano_id, zoom)?;
    Ok(stream::iter(addresses).then(move |address| async move { fetcher.fetch(&address).await }))
}
