//! Black border trimming.
//!
//! Panoramas that do not fill their full tile grid come back with the
//! unused bottom rows and right-hand columns padded black, and a skipped
//! tile leaves the same artifact on the assembled canvas. This module
//! detects that padding on a grayscale view of the canvas and crops it
//! off.
//!
//! Detection is a heuristic, not a guarantee: the padded region is
//! indistinguishable from genuinely near-black content, so pathological
//! images can lose a dark margin or keep a padded one. The contract is
//! "removes the common case of padding", nothing stronger.

use image::{imageops, GrayImage, RgbImage};
use tracing::{debug, info};

/// Highest grayscale value still considered black padding.
pub const BLACK_LUMINANCE: u8 = 4;

/// Crops away the all-black bottom rows and right-hand columns.
///
/// Scans the grayscale conversion of the canvas for the content
/// frontier in each direction; a frontier candidate only counts when the
/// entire rectangle beyond it is at or below [`BLACK_LUMINANCE`], which
/// rejects stray bright pixels near the true border. If neither scan
/// finds a frontier narrower than the full canvas the image is returned
/// unchanged, which also makes the operation idempotent: a cropped
/// result always has content in its last row and column.
pub fn crop_black_border(image: RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image;
    }

    let gray = imageops::grayscale(&image);
    let valid_height = scan_bottom(&gray);
    let valid_width = scan_right(&gray);

    if valid_width == width && valid_height == height {
        debug!(width = width, height = height, "no black border detected");
        return image;
    }

    info!(
        from_width = width,
        from_height = height,
        to_width = valid_width,
        to_height = valid_height,
        "found black border, cropping"
    );
    imageops::crop_imm(&image, 0, 0, valid_width, valid_height).to_image()
}

/// Finds the valid height: one past the lowest row that carries content.
///
/// Walks columns left to right; within a column, rows bottom to top. The
/// first pixel above the threshold is accepted as the bottom frontier
/// only if every pixel strictly below that row, across the full width,
/// is at or below the threshold. Otherwise the scan restarts one column
/// to the right. A column with no bright pixel at all is skipped the
/// same way. Returns the full height when no frontier is found.
fn scan_bottom(gray: &GrayImage) -> u32 {
    let (width, height) = gray.dimensions();

    for col in 0..width {
        for row in (0..height).rev() {
            if gray.get_pixel(col, row)[0] <= BLACK_LUMINANCE {
                continue;
            }
            if region_is_black(gray, 0, row + 1, width, height) {
                return row + 1;
            }
            // Bright pixel without a clean border below it; try the next column
            break;
        }
    }
    height
}

/// Finds the valid width: one past the rightmost column that carries
/// content. Mirror of [`scan_bottom`], walking rows top to bottom and
/// columns right to left, verifying the rectangle to the right.
fn scan_right(gray: &GrayImage) -> u32 {
    let (width, height) = gray.dimensions();

    for row in 0..height {
        for col in (0..width).rev() {
            if gray.get_pixel(col, row)[0] <= BLACK_LUMINANCE {
                continue;
            }
            if region_is_black(gray, col + 1, 0, width, height) {
                return col + 1;
            }
            break;
        }
    }
    width
}

/// Whether every pixel in `[x0, x1) × [y0, y1)` is at or below the
/// threshold. Empty rectangles are trivially black.
fn region_is_black(gray: &GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) -> bool {
    for y in y0..y1 {
        for x in x0..x1 {
            if gray.get_pixel(x, y)[0] > BLACK_LUMINANCE {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::image_digest;
    use image::Rgb;

    /// Gray-valued image with a bright content region at the top left
    /// and `border` gray everywhere else.
    fn bordered_image(
        width: u32,
        height: u32,
        content_width: u32,
        content_height: u32,
        border: u8,
    ) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            if x < content_width && y < content_height {
                Rgb([200, 200, 200])
            } else {
                Rgb([border, border, border])
            }
        })
    }

    #[test]
    fn test_crop_removes_bottom_and_right_border() {
        let image = bordered_image(1024, 512, 700, 300, 0);

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (700, 300));
    }

    #[test]
    fn test_crop_removes_bottom_only_border() {
        let image = bordered_image(256, 128, 256, 100, 0);

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (256, 100));
    }

    #[test]
    fn test_crop_removes_right_only_border() {
        let image = bordered_image(256, 128, 200, 128, 0);

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (200, 128));
    }

    #[test]
    fn test_no_border_passes_through_unchanged() {
        let image = bordered_image(256, 128, 256, 128, 0);
        let before = image_digest(&image);

        let result = crop_black_border(image);
        assert_eq!(result.dimensions(), (256, 128));
        assert_eq!(image_digest(&result), before);
    }

    #[test]
    fn test_crop_is_idempotent() {
        let image = bordered_image(512, 256, 300, 200, 0);

        let once = crop_black_border(image);
        let once_digest = image_digest(&once);
        let twice = crop_black_border(once);

        assert_eq!(twice.dimensions(), (300, 200));
        assert_eq!(image_digest(&twice), once_digest);
    }

    #[test]
    fn test_threshold_luminance_is_cropped() {
        // Padding at exactly the threshold value still counts as black
        let image = bordered_image(128, 64, 50, 40, BLACK_LUMINANCE);

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (50, 40));
    }

    #[test]
    fn test_above_threshold_luminance_is_content() {
        let image = bordered_image(128, 64, 50, 40, BLACK_LUMINANCE + 1);

        let result = crop_black_border(image);
        assert_eq!(result.dimensions(), (128, 64));
    }

    #[test]
    fn test_fully_black_image_unchanged() {
        let image = RgbImage::new(64, 32);

        let result = crop_black_border(image);
        assert_eq!(result.dimensions(), (64, 32));
    }

    #[test]
    fn test_zero_sized_image_unchanged() {
        let image = RgbImage::new(0, 0);

        let result = crop_black_border(image);
        assert_eq!(result.dimensions(), (0, 0));
    }

    #[test]
    fn test_stray_bright_pixels_extend_the_kept_region() {
        // Stray content inside the padded region forces the frontier
        // scans past their first candidates: every content column fails
        // verification until the scan reaches the stray pixel's column.
        let mut image = bordered_image(100, 60, 40, 30, 0);
        image.put_pixel(70, 50, Rgb([200, 200, 200]));

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (71, 51));
    }

    #[test]
    fn test_crop_large_panorama_with_interior_bright_specks() {
        // Full zoom 3 canvas with specks placed so both scans churn
        // through false positives before settling on the true frontier
        let mut image = bordered_image(4096, 2048, 2048, 1024, 0);
        image.put_pixel(3000, 1030, Rgb([200, 200, 200]));
        image.put_pixel(4000, 2, Rgb([200, 200, 200]));

        let cropped = crop_black_border(image);
        assert_eq!(cropped.dimensions(), (4001, 1031));
    }

    #[test]
    fn test_bright_bottom_right_corner_prevents_crop() {
        let image = RgbImage::from_pixel(64, 32, Rgb([200, 200, 200]));

        let result = crop_black_border(image);
        assert_eq!(result.dimensions(), (64, 32));
    }
}
