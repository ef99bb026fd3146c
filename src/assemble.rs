//! Panorama assembly.
//!
//! Composites a stream of tiles onto a single canvas. The canvas size is
//! a pure function of the zoom level and is allocated up front, so the
//! assembled image always has the full grid dimensions no matter how
//! many tiles actually arrive; regions whose tiles never arrive keep the
//! initial black fill.

use crate::error::{DownloadError, FetchError};
use crate::fetch::Tile;
use crate::grid::{grid_dimensions, GridError, TILE_SIZE};
use futures::pin_mut;
use futures::stream::{Stream, StreamExt};
use image::{imageops, RgbImage};
use tracing::{debug, trace};

/// Assembles tiles from a blocking stream into the panorama canvas.
///
/// Consumes the stream single-pass and pastes each tile at pixel offset
/// `(x * 512, y * 512)`. Paste order does not matter: tiles never
/// overlap, so any arrival order produces the same canvas. The first
/// `Err` item aborts the assembly and is returned; a stream that filters
/// failures out (skip policy) therefore assembles everything it yields.
///
/// # Errors
///
/// [`DownloadError::Grid`] for an invalid zoom level (before consuming
/// any tile), or [`DownloadError::Fetch`] for the first failed tile.
pub fn assemble_panorama<I>(zoom: u8, tiles: I) -> Result<RgbImage, DownloadError>
where
    I: IntoIterator<Item = Result<Tile, FetchError>>,
{
    let mut canvas = allocate_canvas(zoom)?;

    let mut pasted = 0usize;
    for tile in tiles {
        paste_tile(&mut canvas, &tile?);
        pasted += 1;
    }

    debug!(
        zoom = zoom,
        tiles = pasted,
        width = canvas.width(),
        height = canvas.height(),
        "panorama assembled"
    );
    Ok(canvas)
}

/// Assembles tiles from an async stream into the panorama canvas.
///
/// Async counterpart of [`assemble_panorama`] with identical semantics.
pub async fn assemble_panorama_stream<S>(zoom: u8, tiles: S) -> Result<RgbImage, DownloadError>
where
    S: Stream<Item = Result<Tile, FetchError>>,
{
    let mut canvas = allocate_canvas(zoom)?;

    let mut pasted = 0usize;
    pin_mut!(tiles);
    while let Some(tile) = tiles.next().await {
        paste_tile(&mut canvas, &tile?);
        pasted += 1;
    }

    debug!(
        zoom = zoom,
        tiles = pasted,
        width = canvas.width(),
        height = canvas.height(),
        "panorama assembled"
    );
    Ok(canvas)
}

/// Allocates the zero-filled (black) canvas for a zoom level.
fn allocate_canvas(zoom: u8) -> Result<RgbImage, GridError> {
    let (width, height) = grid_dimensions(zoom)?;
    Ok(RgbImage::new(width * TILE_SIZE, height * TILE_SIZE))
}

/// Copies one tile's pixels onto the canvas at its grid offset.
///
/// A tile larger than its cell is clipped at the canvas edge, never
/// reallocated; the service serves fixed 512×512 tiles in practice.
fn paste_tile(canvas: &mut RgbImage, tile: &Tile) {
    trace!(x = tile.x, y = tile.y, "pasting tile");
    imageops::replace(
        canvas,
        &tile.image,
        i64::from(tile.x) * i64::from(TILE_SIZE),
        i64::from(tile.y) * i64::from(TILE_SIZE),
    );
}
