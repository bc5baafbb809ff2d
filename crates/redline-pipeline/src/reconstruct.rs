//! Line reconstruction: carry marker pixels from redline space into
//! baseline space and group them into straight strokes.
//!
//! 1. **Translate**: shift each marker pixel by the anchor-to-anchor
//!    offset plus a residual bias, then clamp into the baseline.
//! 2. **Snap**: move each translated pixel onto the nearest near-black
//!    pixel of the baseline along the four diagonals, so annotations
//!    follow existing drawing strokes.
//! 3. **Cluster**: greedily split the snapped sequence into lines by
//!    45 degree continuity. The grouping is order-sensitive and depends
//!    on the raster order the scanner recorded.
//!
//! Statistics over the translated (unsnapped) pixels are computed as
//! diagnostics; nothing is rejected on their basis.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::canvas::PixelBuffer;
use crate::color::{ColorRanges, RangeName};
use crate::types::{Dimensions, Line, LineSet, Offset, Pixel, PipelineConfig};

/// Result of snapping one translated pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapOutcome {
    /// A near-black pixel was found within the search radius.
    Snapped(Pixel),
    /// The search reached the image border first; the query pixel is kept
    /// unchanged.
    OutOfBounds(Pixel),
    /// No near-black pixel within the radius; the pixel is discarded.
    Missed,
}

impl SnapOutcome {
    /// The pixel to keep for clustering, if any.
    #[must_use]
    pub const fn pixel(self) -> Option<Pixel> {
        match self {
            Self::Snapped(p) | Self::OutOfBounds(p) => Some(p),
            Self::Missed => None,
        }
    }
}

/// Search outward from `at` along the four diagonals for a near-black
/// pixel of `baseline`.
///
/// At each radius `i` in `0..=radius` the candidates are tried in the
/// order up-left, down-left, down-right, up-right, and the first match
/// wins. Before each step the full square of side `2i + 1` around `at`
/// must lie inside the image; otherwise the search stops and returns
/// [`SnapOutcome::OutOfBounds`]. The baseline is never read out of
/// bounds.
#[must_use]
pub fn snap_to_near_black<B: PixelBuffer>(
    baseline: &B,
    ranges: &ColorRanges,
    at: Pixel,
    radius: u32,
) -> SnapOutcome {
    let dims = baseline.dimensions();
    for i in 0..=i64::from(radius) {
        let up_left = Pixel::new(at.x - i, at.y - i);
        let down_right = Pixel::new(at.x + i, at.y + i);
        if !dims.contains(up_left) || !dims.contains(down_right) {
            return SnapOutcome::OutOfBounds(at);
        }

        let candidates = [
            up_left,
            Pixel::new(at.x - i, at.y + i),
            down_right,
            Pixel::new(at.x + i, at.y - i),
        ];
        for candidate in candidates {
            if baseline
                .read_at(candidate)
                .is_some_and(|c| ranges.is(c, RangeName::NearBlack))
            {
                return SnapOutcome::Snapped(candidate);
            }
        }
    }
    SnapOutcome::Missed
}

/// Translate every pixel by `offset` and clamp it into `bounds`.
#[must_use]
pub fn translate_changes(changes: &[Pixel], offset: Offset, bounds: Dimensions) -> Vec<Pixel> {
    changes
        .iter()
        .map(|p| p.translate(offset).clamp_to(bounds))
        .collect()
}

/// Group an ordered point sequence into lines by diagonal continuity.
///
/// A point extends the current line when it lies on a 45 degree diagonal
/// from the line's last point (duplicates included) or when the line
/// holds a single point; otherwise it starts a new line. The grouping is
/// a single greedy pass and depends on input order.
#[must_use]
pub fn cluster_lines(points: impl IntoIterator<Item = Pixel>) -> LineSet {
    let mut lines = LineSet::new();
    for point in points {
        match lines.last_mut() {
            Some(line) if line.len() == 1 || line.end().is_diagonal_to(point) => line.push(point),
            _ => lines.push(Line::starting_at(point)),
        }
    }
    lines
}

/// Mean and population standard deviation of a point cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointStats {
    /// Number of points summarized.
    pub count: usize,
    /// Mean X.
    pub mean_x: f64,
    /// Mean Y.
    pub mean_y: f64,
    /// Standard deviation of X.
    pub std_x: f64,
    /// Standard deviation of Y.
    pub std_y: f64,
}

impl PointStats {
    /// Summarize `points`, or `None` if there are none.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn of(points: &[Pixel]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
        let mean_y = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
        let var_x = points
            .iter()
            .map(|p| (p.x as f64 - mean_x).powi(2))
            .sum::<f64>()
            / n;
        let var_y = points
            .iter()
            .map(|p| (p.y as f64 - mean_y).powi(2))
            .sum::<f64>()
            / n;
        Some(Self {
            count: points.len(),
            mean_x,
            mean_y,
            std_x: var_x.sqrt(),
            std_y: var_y.sqrt(),
        })
    }

    /// `(mean - std, mean + std)` along X.
    #[must_use]
    pub fn x_band(&self) -> (f64, f64) {
        (self.mean_x - self.std_x, self.mean_x + self.std_x)
    }

    /// `(mean - std, mean + std)` along Y.
    #[must_use]
    pub fn y_band(&self) -> (f64, f64) {
        (self.mean_y - self.std_y, self.mean_y + self.std_y)
    }
}

/// Everything line reconstruction produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconstruction {
    /// Total translation applied (anchor difference plus bias).
    pub offset: Offset,
    /// Reconstructed lines in discovery order.
    pub lines: LineSet,
    /// Pixels moved onto a near-black stroke.
    pub snapped: usize,
    /// Pixels whose search hit the image border and were kept in place.
    pub kept: usize,
    /// Pixels dropped because no stroke was within reach.
    pub discarded: usize,
    /// Diagnostics over translated, unsnapped pixels.
    pub stats: Option<PointStats>,
}

/// Reconstruct lines from the redline's marker pixels.
///
/// `changes` must be in the raster order the scanner recorded.
/// `baseline` should already be cleaned so near-black strokes are pure.
#[instrument(skip_all, fields(changes = changes.len()))]
pub fn reconstruct<B: PixelBuffer>(
    changes: &[Pixel],
    redline_anchor: Pixel,
    baseline_anchor: Pixel,
    baseline: &B,
    config: &PipelineConfig,
) -> Reconstruction {
    let offset = Offset::between(redline_anchor, baseline_anchor).plus(config.bias);
    let translated = translate_changes(changes, offset, baseline.dimensions());
    let stats = PointStats::of(&translated);

    let (mut snapped, mut kept, mut discarded) = (0, 0, 0);
    let points: Vec<Pixel> = translated
        .iter()
        .filter_map(|&p| {
            let outcome = snap_to_near_black(baseline, &config.ranges, p, config.snap_radius);
            match outcome {
                SnapOutcome::Snapped(_) => snapped += 1,
                SnapOutcome::OutOfBounds(_) => kept += 1,
                SnapOutcome::Missed => discarded += 1,
            }
            outcome.pixel()
        })
        .collect();

    let lines = cluster_lines(points);
    debug!(
        dx = offset.dx,
        dy = offset.dy,
        snapped,
        kept,
        discarded,
        lines = lines.len(),
        "reconstructed lines"
    );

    Reconstruction {
        offset,
        lines,
        snapped,
        kept,
        discarded,
        stats,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::RgbaImage;

    use super::*;
    use crate::color::{BLACK, WHITE};

    fn blank(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, WHITE)
    }

    fn pixels(coords: &[(i64, i64)]) -> Vec<Pixel> {
        coords.iter().map(|&(x, y)| Pixel::new(x, y)).collect()
    }

    // --- Snap ---

    #[test]
    fn snap_on_black_returns_same_pixel() {
        let mut img = blank(50, 50);
        img.put_pixel(20, 20, BLACK);
        let out = snap_to_near_black(&img, &ColorRanges::default(), Pixel::new(20, 20), 15);
        assert_eq!(out, SnapOutcome::Snapped(Pixel::new(20, 20)));
    }

    #[test]
    fn snap_follows_diagonals_only() {
        let mut img = blank(50, 50);
        // Straight right of the query: never a candidate.
        img.put_pixel(23, 20, BLACK);
        let ranges = ColorRanges::default();
        assert_eq!(
            snap_to_near_black(&img, &ranges, Pixel::new(20, 20), 15),
            SnapOutcome::Missed
        );

        img.put_pixel(23, 23, BLACK);
        assert_eq!(
            snap_to_near_black(&img, &ranges, Pixel::new(20, 20), 15),
            SnapOutcome::Snapped(Pixel::new(23, 23))
        );
    }

    #[test]
    fn snap_prefers_smaller_radius() {
        let mut img = blank(50, 50);
        img.put_pixel(15, 15, BLACK);
        img.put_pixel(22, 18, BLACK);
        let out = snap_to_near_black(&img, &ColorRanges::default(), Pixel::new(20, 20), 15);
        assert_eq!(out, SnapOutcome::Snapped(Pixel::new(22, 18)));
    }

    #[test]
    fn snap_candidate_order_within_a_radius() {
        let ranges = ColorRanges::default();
        let at = Pixel::new(20, 20);
        let all = [(17, 17), (17, 23), (23, 23), (23, 17)];

        // Remove candidates from the front one at a time; the next one in
        // order must win.
        for start in 0..all.len() {
            let mut img = blank(50, 50);
            for &(x, y) in &all[start..] {
                img.put_pixel(x, y, BLACK);
            }
            let (x, y) = all[start];
            assert_eq!(
                snap_to_near_black(&img, &ranges, at, 15),
                SnapOutcome::Snapped(Pixel::new(i64::from(x), i64::from(y)))
            );
        }
    }

    #[test]
    fn snap_beyond_radius_is_missed() {
        let mut img = blank(60, 60);
        img.put_pixel(46, 46, BLACK);
        let ranges = ColorRanges::default();
        assert_eq!(
            snap_to_near_black(&img, &ranges, Pixel::new(30, 30), 15),
            SnapOutcome::Missed
        );
        assert_eq!(
            snap_to_near_black(&img, &ranges, Pixel::new(30, 30), 16),
            SnapOutcome::Snapped(Pixel::new(46, 46))
        );
    }

    #[test]
    fn snap_near_border_stops_without_reading_outside() {
        let mut img = blank(10, 10);
        // Reachable at radius 3 but the search leaves the image at radius 1.
        img.put_pixel(3, 3, BLACK);
        let ranges = ColorRanges::default();
        for corner in pixels(&[(0, 0), (9, 9), (0, 9), (9, 0)]) {
            assert_eq!(
                snap_to_near_black(&img, &ranges, corner, 15),
                SnapOutcome::OutOfBounds(corner)
            );
        }
    }

    #[test]
    fn snap_on_empty_image_is_out_of_bounds() {
        let img = RgbaImage::new(0, 0);
        let at = Pixel::ORIGIN;
        assert_eq!(
            snap_to_near_black(&img, &ColorRanges::default(), at, 15),
            SnapOutcome::OutOfBounds(at)
        );
    }

    // --- Translate ---

    #[test]
    fn translate_clamps_into_bounds() {
        let bounds = Dimensions {
            width: 100,
            height: 100,
        };
        let out = translate_changes(
            &pixels(&[(10, 10), (90, 30), (50, 3)]),
            Offset::new(15, -5),
            bounds,
        );
        assert_eq!(out, pixels(&[(25, 5), (99, 25), (65, 0)]));
    }

    // --- Cluster ---

    #[test]
    fn cluster_empty_input() {
        assert!(cluster_lines(Vec::new()).is_empty());
    }

    #[test]
    fn cluster_single_point_line_accepts_anything() {
        let lines = cluster_lines(pixels(&[(0, 0), (10, 3)]));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 2);
    }

    #[test]
    fn cluster_diagonal_run_stays_together() {
        let lines = cluster_lines(pixels(&[(0, 0), (1, 1), (2, 2), (3, 3), (3, 3), (1, 5)]));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].end(), Pixel::new(1, 5));
    }

    #[test]
    fn cluster_breaks_on_non_diagonal_step() {
        // (0,0) (5,1) forms a two-point line; (6,1) is a horizontal step
        // from (5,1) and starts a new line, which then takes (9,4).
        let lines = cluster_lines(pixels(&[(0, 0), (5, 1), (6, 1), (9, 4), (20, 4)]));
        let shapes: Vec<Vec<Pixel>> = lines.iter().map(|l| l.pixels().to_vec()).collect();
        assert_eq!(
            shapes,
            vec![
                pixels(&[(0, 0), (5, 1)]),
                pixels(&[(6, 1), (9, 4)]),
                pixels(&[(20, 4)]),
            ]
        );
    }

    #[test]
    fn cluster_is_order_sensitive_and_deterministic() {
        let forward = pixels(&[(0, 0), (1, 1), (2, 5), (3, 6)]);
        let mut backward = forward.clone();
        backward.reverse();

        let a = cluster_lines(forward.clone());
        let b = cluster_lines(forward);
        assert_eq!(a, b);

        let reversed = cluster_lines(backward);
        assert_eq!(a.len(), 2);
        assert_eq!(reversed.len(), 2);
        assert_ne!(a[0].pixels(), reversed[0].pixels());
    }

    // --- Stats ---

    #[test]
    fn stats_of_empty_is_none() {
        assert!(PointStats::of(&[]).is_none());
    }

    #[test]
    fn stats_mean_and_population_std() {
        let xs = [2, 4, 4, 4, 5, 5, 7, 9];
        let points: Vec<Pixel> = xs.iter().map(|&x| Pixel::new(x, 10)).collect();
        let stats = PointStats::of(&points).unwrap();
        assert_eq!(stats.count, 8);
        assert!((stats.mean_x - 5.0).abs() < 1e-9);
        assert!((stats.std_x - 2.0).abs() < 1e-9);
        assert!((stats.mean_y - 10.0).abs() < 1e-9);
        assert!(stats.std_y.abs() < 1e-9);

        let (lo, hi) = stats.x_band();
        assert!((lo - 3.0).abs() < 1e-9);
        assert!((hi - 7.0).abs() < 1e-9);
        let (lo, hi) = stats.y_band();
        assert!((lo - 10.0).abs() < 1e-9 && (hi - 10.0).abs() < 1e-9);
    }

    // --- Reconstruct ---

    #[test]
    fn reconstruct_applies_anchor_offset_and_bias() {
        let mut baseline = blank(200, 200);
        baseline.put_pixel(100, 40, BLACK);
        let config = PipelineConfig {
            bias: Offset::new(10, -10),
            ..PipelineConfig::default()
        };
        let changes = pixels(&[(93, 53)]);
        let result = reconstruct(
            &changes,
            Pixel::new(195, 195),
            Pixel::new(190, 190),
            &baseline,
            &config,
        );
        // (93,53) + (-5,-5) + (10,-10) = (98,38); (100,40) is 2 down-right.
        assert_eq!(result.offset, Offset::new(5, -15));
        assert_eq!(result.snapped, 1);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].start(), Pixel::new(100, 40));

        let stats = result.stats.unwrap();
        assert!((stats.mean_x - 98.0).abs() < 1e-9);
        assert!((stats.mean_y - 38.0).abs() < 1e-9);
    }

    #[test]
    fn reconstruct_discards_misses_and_keeps_border_pixels() {
        let baseline = blank(100, 100);
        let config = PipelineConfig {
            bias: Offset::default(),
            ..PipelineConfig::default()
        };
        let changes = pixels(&[(50, 50), (0, 40)]);
        let result = reconstruct(&changes, Pixel::ORIGIN, Pixel::ORIGIN, &baseline, &config);
        assert_eq!(result.discarded, 1);
        assert_eq!(result.kept, 1);
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].pixels(), &[Pixel::new(0, 40)]);
    }

    #[test]
    fn reconstruct_empty_changes() {
        let baseline = blank(10, 10);
        let result = reconstruct(
            &[],
            Pixel::ORIGIN,
            Pixel::ORIGIN,
            &baseline,
            &PipelineConfig::default(),
        );
        assert!(result.lines.is_empty());
        assert!(result.stats.is_none());
    }
}
