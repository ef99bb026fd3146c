//! Tile grid addressing.
//!
//! A panorama at zoom level `z` is served as a grid of 512×512 tiles,
//! `2^z` columns wide and `2^(z-1)` rows tall. This module maps a
//! panorama id and zoom level onto that grid: dimensions, per-tile fetch
//! URLs, and a lazy enumeration of every [`TileAddress`] in the grid.

use thiserror::Error;

/// Lowest zoom level the tile service defines a grid for.
pub const MIN_ZOOM: u8 = 1;

/// Highest supported zoom level. Above this the pixel dimensions of the
/// assembled canvas (`2^zoom * 512`) no longer fit in a `u32`.
pub const MAX_ZOOM: u8 = 22;

/// Edge length of one tile in pixels.
pub const TILE_SIZE: u32 = 512;

/// Tile service endpoint serving panorama tiles.
const TILE_ENDPOINT: &str = "https://cbk0.google.com/cbk";

/// Errors from tile-grid construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// Zoom level outside the supported range.
    #[error("invalid zoom level {0}: must be between {min} and {max}", min = MIN_ZOOM, max = MAX_ZOOM)]
    InvalidZoom(u8),
}

/// Returns the tile-grid dimensions `(width, height)` for a zoom level.
///
/// `width = 2^zoom` and `height = 2^(zoom-1)`; the grid is always twice
/// as wide as it is tall because the service projects the full sphere
/// onto a 2:1 equirectangular layout.
///
/// # Errors
///
/// Returns [`GridError::InvalidZoom`] if `zoom` is outside
/// [`MIN_ZOOM`]`..=`[`MAX_ZOOM`].
pub fn grid_dimensions(zoom: u8) -> Result<(u32, u32), GridError> {
    if !(MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
        return Err(GridError::InvalidZoom(zoom));
    }
    Ok((1u32 << zoom, 1u32 << (zoom - 1)))
}

/// Builds the fetch URL for one tile.
///
/// Pure string formatting: `x` and `y` are deliberately not checked
/// against the grid bounds. The service answers out-of-range coordinates
/// with a well-formed placeholder image, and probing past the grid edge
/// is a supported way to detect a panorama's true extent.
pub fn tile_url(pano_id: &str, zoom: u8, x: u32, y: u32) -> String {
    format!(
        "{}?output=tile&panoid={}&zoom={}&x={}&y={}",
        TILE_ENDPOINT, pano_id, zoom, x, y
    )
}

/// Fetch target for one tile of a panorama.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileAddress {
    /// Column index within the grid, 0 at the left edge
    pub x: u32,
    /// Row index within the grid, 0 at the top edge
    pub y: u32,
    /// Fully-formed fetch URL for this tile
    pub url: String,
}

impl TileAddress {
    /// Creates the address for grid cell `(x, y)` of a panorama.
    pub fn new(pano_id: &str, zoom: u8, x: u32, y: u32) -> Self {
        Self {
            x,
            y,
            url: tile_url(pano_id, zoom, x, y),
        }
    }
}

/// Returns a lazy iterator over every tile address in the grid.
///
/// Addresses are produced in column-major order: all rows of column 0
/// from the top down, then column 1, and so on. The first element is
/// always `(0, 0)`. The iterator is finite with exactly
/// `width * height` elements and can be recreated at any time; URLs are
/// only formatted as elements are pulled.
///
/// # Example
///
/// ```
/// use panostitch::grid::tile_addresses;
///
/// let mut addresses = tile_addresses("abc123", 2).unwrap();
/// assert_eq!(addresses.len(), 8);
///
/// let first = addresses.next().unwrap();
/// assert_eq!((first.x, first.y), (0, 0));
/// let second = addresses.next().unwrap();
/// assert_eq!((second.x, second.y), (0, 1));
/// ```
pub fn tile_addresses(pano_id: &str, zoom: u8) -> Result<TileAddresses, GridError> {
    let (width, height) = grid_dimensions(zoom)?;
    Ok(TileAddresses {
        pano_id: pano_id.to_string(),
        zoom,
        width,
        height,
        current: 0,
    })
}

/// Iterator over all tile addresses of one panorama grid.
///
/// Yields `width * height` addresses in column-major order.
#[derive(Debug, Clone)]
pub struct TileAddresses {
    pano_id: String,
    zoom: u8,
    width: u32,
    height: u32,
    current: u64,
}

impl TileAddresses {
    /// Total number of addresses in the grid.
    fn total(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Iterator for TileAddresses {
    type Item = TileAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.total() {
            return None;
        }

        // Column-major: walk down each column before moving right
        let x = (self.current / u64::from(self.height)) as u32;
        let y = (self.current % u64::from(self.height)) as u32;

        self.current += 1;

        Some(TileAddress::new(&self.pano_id, self.zoom, x, y))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total() - self.current) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileAddresses {
    fn len(&self) -> usize {
        (self.total() - self.current) as usize
    }
}
