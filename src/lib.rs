//! panostitch - Street-level panorama downloading and stitching
//!
//! This library retrieves the 512×512 tiles that make up a street-level
//! panorama, reassembles them into a single image, and optionally trims
//! the black padding that irregular panoramas carry at their bottom and
//! right edges.
//!
//! # High-Level API
//!
//! For most use cases, the [`downloader`] module provides a facade over
//! the full pipeline:
//!
//! ```ignore
//! use panostitch::client::ReqwestTileClient;
//! use panostitch::config::DownloadConfig;
//! use panostitch::downloader::PanoramaDownloader;
//! use panostitch::trim::crop_black_border;
//!
//! let client = ReqwestTileClient::new()?;
//! let downloader = PanoramaDownloader::new(client, DownloadConfig::default());
//!
//! let panorama = downloader.download("z80QZ1_QgCbYwj7RrmlS0Q", 3)?;
//! let panorama = crop_black_border(panorama);
//! ```
//!
//! The pipeline stages are public for callers that want to drive them
//! directly: [`grid`] enumerates tile addresses, [`fetch`] retrieves one
//! tile with retry, [`stream`] drives the fetcher over a whole grid in
//! sequential, worker-pool, or async form, and [`assemble`] composites
//! the result onto the canvas.

pub mod assemble;
pub mod client;
pub mod config;
pub mod downloader;
pub mod error;
pub mod fetch;
pub mod grid;
pub mod hash;
pub mod stream;
pub mod trim;

/// Version of the panostitch library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_grid_module_is_accessible() {
        let (width, height) = grid::grid_dimensions(1).unwrap();
        assert_eq!((width, height), (2, 1));
    }
}
