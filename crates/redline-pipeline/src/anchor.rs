//! Edge anchor: the registration point shared by both scans.
//!
//! Both documents carry the same bottom-right structure (a border line)
//! even though the scans are not pixel-aligned. Walking backwards from
//! the bottom-right corner, the first near-black pixel is a stable
//! landmark; the difference between the two landmarks is the translation
//! between the scans.

use tracing::{debug, warn};

use crate::canvas::PixelBuffer;
use crate::color::{ColorRanges, RangeName};
use crate::types::Pixel;

/// Find the first near-black pixel scanning from the bottom-right corner.
///
/// Rows are visited from the bottom up and, within a row, columns from
/// right to left. Returns `None` if the image contains no near-black
/// pixel.
#[must_use = "returns the anchor pixel, if any"]
pub fn find_anchor<B: PixelBuffer>(image: &B, ranges: &ColorRanges) -> Option<Pixel> {
    let dims = image.dimensions();
    for y in (0..dims.height).rev() {
        for x in (0..dims.width).rev() {
            if ranges.is(image.pixel(x, y), RangeName::NearBlack) {
                let anchor = Pixel::new(i64::from(x), i64::from(y));
                debug!(x = anchor.x, y = anchor.y, "anchor found");
                return Some(anchor);
            }
        }
    }
    None
}

/// Like [`find_anchor`] but falls back to [`Pixel::ORIGIN`] when the
/// image has no near-black pixel.
#[must_use = "returns the anchor pixel"]
pub fn anchor_or_origin<B: PixelBuffer>(image: &B, ranges: &ColorRanges) -> Pixel {
    find_anchor(image, ranges).unwrap_or_else(|| {
        warn!("no near-black pixel found; anchoring at the origin");
        Pixel::ORIGIN
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::color::{BLACK, WHITE};

    #[test]
    fn finds_bottom_right_most_black() {
        let mut img = RgbaImage::from_pixel(20, 20, WHITE);
        img.put_pixel(3, 18, BLACK);
        img.put_pixel(15, 18, BLACK);
        img.put_pixel(19, 10, BLACK);
        // Lowest row wins over rightmost column; within the row, the
        // rightmost pixel wins.
        assert_eq!(
            find_anchor(&img, &ColorRanges::default()),
            Some(Pixel::new(15, 18))
        );
    }

    #[test]
    fn corner_pixel_is_reachable() {
        let mut img = RgbaImage::from_pixel(5, 5, WHITE);
        img.put_pixel(4, 4, BLACK);
        assert_eq!(
            find_anchor(&img, &ColorRanges::default()),
            Some(Pixel::new(4, 4))
        );

        let mut img = RgbaImage::from_pixel(5, 5, WHITE);
        img.put_pixel(0, 0, BLACK);
        assert_eq!(
            find_anchor(&img, &ColorRanges::default()),
            Some(Pixel::new(0, 0))
        );
    }

    #[test]
    fn near_black_counts_as_anchor() {
        let mut img = RgbaImage::from_pixel(5, 5, WHITE);
        img.put_pixel(2, 3, Rgba([40, 40, 40, 255]));
        assert_eq!(
            find_anchor(&img, &ColorRanges::default()),
            Some(Pixel::new(2, 3))
        );
    }

    #[test]
    fn no_black_returns_none_and_origin_fallback() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 10, 10, 255]));
        assert_eq!(find_anchor(&img, &ColorRanges::default()), None);
        assert_eq!(anchor_or_origin(&img, &ColorRanges::default()), Pixel::ORIGIN);
    }

    #[test]
    fn empty_image_falls_back_to_origin() {
        let img = RgbaImage::new(0, 0);
        assert_eq!(anchor_or_origin(&img, &ColorRanges::default()), Pixel::ORIGIN);
    }
}
