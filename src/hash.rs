//! Content digests for raster images.
//!
//! Used to pin image content in tests and to compare pipeline outputs
//! without keeping full pixel buffers around: two images share a digest
//! exactly when they have the same dimensions and the same pixels.

use image::RgbImage;

/// Returns a hex digest of an image's dimensions and raw pixel data.
///
/// The digest is computed over the raw RGB samples rather than an
/// encoded form, so it does not depend on any codec or encoder settings.
/// Dimensions are mixed in ahead of the samples, so two images with the
/// same pixel bytes but different shapes digest differently.
pub fn image_digest(image: &RgbImage) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&image.width().to_le_bytes());
    hasher.update(&image.height().to_le_bytes());
    hasher.update(image.as_raw());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_digest_is_deterministic() {
        let image = RgbImage::from_pixel(16, 8, Rgb([10, 20, 30]));
        assert_eq!(image_digest(&image), image_digest(&image.clone()));
    }

    #[test]
    fn test_digest_changes_with_one_pixel() {
        let image = RgbImage::from_pixel(16, 8, Rgb([10, 20, 30]));
        let mut altered = image.clone();
        altered.put_pixel(3, 2, Rgb([11, 20, 30]));

        assert_ne!(image_digest(&image), image_digest(&altered));
    }

    #[test]
    fn test_digest_distinguishes_shapes_with_identical_samples() {
        // 2×1 and 1×2 share the same raw byte sequence
        let wide = RgbImage::from_pixel(2, 1, Rgb([5, 5, 5]));
        let tall = RgbImage::from_pixel(1, 2, Rgb([5, 5, 5]));
        assert_eq!(wide.as_raw(), tall.as_raw());

        assert_ne!(image_digest(&wide), image_digest(&tall));
    }

    #[test]
    fn test_digest_is_hex_encoded() {
        let digest = image_digest(&RgbImage::new(4, 4));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
