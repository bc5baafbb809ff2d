//! Shared types for the redline transfer pipeline.

use serde::{Deserialize, Serialize};

use crate::color::ColorRanges;

/// Re-export `RgbaImage` so downstream crates can hand images to the
/// pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// An integer pixel coordinate in image space.
///
/// Coordinates are signed so that translated positions may fall outside
/// the image before they are clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pixel {
    /// Column (pixels from the left edge).
    pub x: i64,
    /// Row (pixels from the top edge).
    pub y: i64,
}

impl Pixel {
    /// The image origin, used as the fallback registration anchor.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a new pixel coordinate.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Translate by an offset.
    #[must_use]
    pub const fn translate(self, offset: Offset) -> Self {
        Self {
            x: self.x + offset.dx,
            y: self.y + offset.dy,
        }
    }

    /// Clamp into `[0, width) x [0, height)`.
    ///
    /// A zero-sized dimension clamps to 0.
    #[must_use]
    pub fn clamp_to(self, dimensions: Dimensions) -> Self {
        let max_x = i64::from(dimensions.width).saturating_sub(1).max(0);
        let max_y = i64::from(dimensions.height).saturating_sub(1).max(0);
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
        }
    }

    /// Returns `true` if this pixel lies on a 45 degree diagonal from `other`
    /// (equal absolute X and Y differences, including zero).
    #[must_use]
    pub const fn is_diagonal_to(self, other: Self) -> bool {
        (self.x - other.x).abs() == (self.y - other.y).abs()
    }
}

/// A componentwise translation between two coordinate spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Offset {
    /// Horizontal shift in pixels.
    pub dx: i64,
    /// Vertical shift in pixels.
    pub dy: i64,
}

impl Offset {
    /// Create a new offset.
    #[must_use]
    pub const fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    /// The offset that carries `from` onto `to` (`to - from`).
    #[must_use]
    pub const fn between(from: Pixel, to: Pixel) -> Self {
        Self {
            dx: to.x - from.x,
            dy: to.y - from.y,
        }
    }

    /// Componentwise sum.
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self {
            dx: self.dx + other.dx,
            dy: self.dy + other.dy,
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Dimensions of an RGBA image.
    #[must_use]
    pub fn of(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Returns `true` if `pixel` lies inside the image.
    #[must_use]
    pub fn contains(self, pixel: Pixel) -> bool {
        pixel.x >= 0
            && pixel.y >= 0
            && pixel.x < i64::from(self.width)
            && pixel.y < i64::from(self.height)
    }
}

/// One reconstructed stroke: an ordered, non-empty run of pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line(Vec<Pixel>);

impl Line {
    /// Start a line at `first`.
    #[must_use]
    pub fn starting_at(first: Pixel) -> Self {
        Self(vec![first])
    }

    /// Append a pixel to the end of the line.
    pub fn push(&mut self, pixel: Pixel) {
        self.0.push(pixel);
    }

    /// Number of pixels in the line (always at least 1).
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; a line is created with its first pixel.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first pixel.
    #[must_use]
    pub fn start(&self) -> Pixel {
        self.0.first().copied().unwrap_or_default()
    }

    /// The most recently appended pixel.
    #[must_use]
    pub fn end(&self) -> Pixel {
        self.0.last().copied().unwrap_or_default()
    }

    /// All pixels in insertion order.
    #[must_use]
    pub fn pixels(&self) -> &[Pixel] {
        &self.0
    }
}

/// Lines in discovery order.
pub type LineSet = Vec<Line>;

/// Coverage-weight tuning for the antialiased line rasterizer.
///
/// Calibrated against one scanner's output; see
/// [`raster`](crate::raster) for how the boosts are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WuTuning {
    /// Multiplier applied to the raw coverage before clamping to 1.0.
    pub coverage_boost: f64,
    /// Further multiplier applied when blending the secondary sample.
    pub blend_boost: f64,
}

impl WuTuning {
    /// Default primary coverage boost.
    pub const DEFAULT_COVERAGE_BOOST: f64 = 1.3;
    /// Default blend boost.
    pub const DEFAULT_BLEND_BOOST: f64 = 1.2;
}

impl Default for WuTuning {
    fn default() -> Self {
        Self {
            coverage_boost: Self::DEFAULT_COVERAGE_BOOST,
            blend_boost: Self::DEFAULT_BLEND_BOOST,
        }
    }
}

/// Configuration for the transfer pipeline.
///
/// All parameters have defaults tuned to the scanner the tool was built
/// against. Every calibration value is exposed here rather than inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Colour ranges in priority order. Rewrite flags are set per pass by
    /// the orchestrator; the values here are only the geometry.
    pub ranges: ColorRanges,

    /// Residual shift added on top of the anchor-to-anchor offset.
    pub bias: Offset,

    /// Maximum diagonal radius searched when snapping a translated pixel
    /// onto a near-black stroke of the baseline.
    pub snap_radius: u32,

    /// Number of leading reconstructed lines that are never drawn.
    ///
    /// The earliest clusters are consistently noise near the start of
    /// the scan.
    pub skip_lines: usize,

    /// Colour used to draw reconstructed lines (RGBA).
    pub line_color: [u8; 4],

    /// Antialiasing weight boosts.
    pub wu: WuTuning,
}

impl PipelineConfig {
    /// Default residual shift, X component.
    pub const DEFAULT_BIAS_X: i64 = 60;
    /// Default residual shift, Y component.
    pub const DEFAULT_BIAS_Y: i64 = -45;
    /// Default snap radius in pixels.
    pub const DEFAULT_SNAP_RADIUS: u32 = 15;
    /// Default number of skipped leading lines.
    pub const DEFAULT_SKIP_LINES: usize = 6;
    /// Default line colour: cornflower blue.
    pub const DEFAULT_LINE_COLOR: [u8; 4] = [44, 149, 237, 255];

    /// Check the configuration for contradictions.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if any colour range has
    /// an empty channel interval, a range name repeats, or two ranges
    /// overlap.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.ranges.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ranges: ColorRanges::default(),
            bias: Offset::new(Self::DEFAULT_BIAS_X, Self::DEFAULT_BIAS_Y),
            snap_radius: Self::DEFAULT_SNAP_RADIUS,
            skip_lines: Self::DEFAULT_SKIP_LINES,
            line_color: Self::DEFAULT_LINE_COLOR,
            wu: WuTuning::default(),
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
