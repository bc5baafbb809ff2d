//! Image scanner: classify every pixel once, count colours, and
//! optionally rewrite matched pixels to their range's canonical colour.
//!
//! Pixels are visited in raster order (rows top to bottom, columns left
//! to right). The order is observable: rewritten coordinates are
//! recorded in exactly this order, and line reconstruction depends on it.

use std::collections::{BTreeMap, HashMap};

use image::Rgba;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::canvas::PixelBuffer;
use crate::color::{ColorRanges, RangeName};
use crate::types::Pixel;

/// How often one exact original colour occurred, and what it classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCount {
    /// Number of pixels with this colour.
    pub count: u64,
    /// The range the colour resolved to, if any.
    pub range: Option<RangeName>,
}

/// Per-colour aggregate keyed by exact RGBA value.
pub type ColorTable = HashMap<Rgba<u8>, ColorCount>;

/// Rewritten pixel coordinates per range, in raster order.
pub type ChangeSet = BTreeMap<RangeName, Vec<Pixel>>;

/// Output of one scan pass.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Count per distinct original colour.
    pub colors: ColorTable,
    /// Coordinates rewritten under each range.
    pub changes: ChangeSet,
}

impl ScanResult {
    /// Coordinates rewritten under `name`, or an empty slice.
    #[must_use]
    pub fn changed(&self, name: RangeName) -> &[Pixel] {
        self.changes
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total number of pixels visited.
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        self.colors.values().map(|c| c.count).sum()
    }
}

/// Scan `image` once in raster order.
///
/// Each pixel's original colour is classified with `ranges` and counted.
/// When `apply` is set and the resolved range has its `replace` flag set,
/// the pixel is overwritten with the range's canonical colour and its
/// coordinate recorded under the range's name.
///
/// With `apply == false` the image is never written.
#[instrument(skip(image, ranges))]
pub fn scan<B: PixelBuffer>(image: &mut B, ranges: &ColorRanges, apply: bool) -> ScanResult {
    let dims = image.dimensions();
    let mut result = ScanResult::default();

    for y in 0..dims.height {
        for x in 0..dims.width {
            let original = image.pixel(x, y);

            let entry = result.colors.entry(original).or_insert_with(|| ColorCount {
                count: 0,
                range: ranges.classify(original).map(|r| r.name),
            });
            entry.count += 1;

            if !apply {
                continue;
            }
            let Some(range) = entry.range.and_then(|name| ranges.get(name)) else {
                continue;
            };
            if range.replace {
                image.set_pixel(x, y, range.canonical_color());
                result
                    .changes
                    .entry(range.name)
                    .or_default()
                    .push(Pixel::new(i64::from(x), i64::from(y)));
            }
        }
    }

    debug!(
        distinct_colors = result.colors.len(),
        rewritten = result.changes.values().map(Vec::len).sum::<usize>(),
        "scan complete"
    );
    result
}
