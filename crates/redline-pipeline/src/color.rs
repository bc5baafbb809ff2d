//! Colour classification: bucket scanned pixels into named RGB ranges.
//!
//! A [`ColorRange`] is an axis-aligned box in RGB space. Each channel
//! admits values in the half-open interval `(min, max]`: a value equal
//! to the minimum is rejected, a value equal to the maximum is accepted.
//! Ranges are tried in priority order and the first match wins. Alpha
//! never takes part in classification.
//!
//! Whether a range rewrites the pixels it matches is carried on the
//! range itself, but is set per scan pass through [`ColorRanges::for_pass`]
//! so there is no shared mutable toggle between passes.

use std::fmt;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// Canonical pure white.
pub const WHITE: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
/// Canonical pure black.
pub const BLACK: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);
/// Colour the marker strokes are rewritten to on the redline.
pub const MARKER_RECOLOR: Rgba<u8> = Rgba([0x64, 0x95, 0xed, 0xff]);

/// Semantic bucket a colour range stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeName {
    /// Paper background and light scan noise.
    NearWhite,
    /// The highlighter hue used for hand annotations.
    Marker,
    /// Printed ink: drawing strokes, borders, text.
    NearBlack,
}

impl fmt::Display for RangeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NearWhite => "whiteish",
            Self::Marker => "yellowish",
            Self::NearBlack => "blackish",
        })
    }
}

/// A named box in RGB space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRange {
    /// Which bucket this range classifies into.
    pub name: RangeName,
    /// Exclusive lower bound per channel (R, G, B). Signed so that `-1`
    /// admits a channel value of zero.
    pub min: [i16; 3],
    /// Inclusive upper bound per channel (R, G, B).
    pub max: [u8; 3],
    /// Whether matched pixels are rewritten to [`canonical`](Self::canonical).
    pub replace: bool,
    /// Replacement colour (RGBA).
    pub canonical: [u8; 4],
}

impl ColorRange {
    /// Returns `true` if every colour channel lies in `(min, max]`.
    #[must_use]
    pub fn admits(&self, color: Rgba<u8>) -> bool {
        (0..3).all(|c| {
            let v = color.0[c];
            i16::from(v) > self.min[c] && v <= self.max[c]
        })
    }

    /// The replacement colour as a pixel value.
    #[must_use]
    pub const fn canonical_color(&self) -> Rgba<u8> {
        Rgba(self.canonical)
    }

    /// Returns `true` if the two boxes share at least one colour.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..3).all(|c| {
            let lo = self.min[c].max(other.min[c]);
            let hi = i16::from(self.max[c].min(other.max[c]));
            lo < hi
        })
    }
}

/// Which buckets a scan pass rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPass {
    /// Snap scan noise to pure white and pure black.
    Clean,
    /// Recolour marker strokes and record where they were.
    ExtractMarker,
    /// Rewrite nothing; only count colours.
    ReadOnly,
}

impl ScanPass {
    /// Returns `true` if this pass rewrites pixels in range `name`.
    #[must_use]
    pub const fn rewrites(self, name: RangeName) -> bool {
        match self {
            Self::Clean => matches!(name, RangeName::NearWhite | RangeName::NearBlack),
            Self::ExtractMarker => matches!(name, RangeName::Marker),
            Self::ReadOnly => false,
        }
    }
}

/// Colour ranges in priority order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorRanges(Vec<ColorRange>);

impl ColorRanges {
    /// Build from an explicit priority-ordered list.
    #[must_use]
    pub const fn new(ranges: Vec<ColorRange>) -> Self {
        Self(ranges)
    }

    /// The ranges in priority order.
    #[must_use]
    pub fn ranges(&self) -> &[ColorRange] {
        &self.0
    }

    /// Look up a range by name.
    #[must_use]
    pub fn get(&self, name: RangeName) -> Option<&ColorRange> {
        self.0.iter().find(|r| r.name == name)
    }

    /// Return the first range that admits `color`, or `None`.
    #[must_use]
    pub fn classify(&self, color: Rgba<u8>) -> Option<&ColorRange> {
        self.0.iter().find(|r| r.admits(color))
    }

    /// Returns `true` if `color` classifies as `name`.
    #[must_use]
    pub fn is(&self, color: Rgba<u8>, name: RangeName) -> bool {
        self.classify(color).is_some_and(|r| r.name == name)
    }

    /// A copy of these ranges with rewrite flags set for `pass`.
    #[must_use]
    pub fn for_pass(&self, pass: ScanPass) -> Self {
        Self(
            self.0
                .iter()
                .map(|r| ColorRange {
                    replace: pass.rewrites(r.name),
                    ..*r
                })
                .collect(),
        )
    }

    /// Check every range for an empty channel interval and every pair for
    /// a repeated name or overlap. Scans look ranges up by name, so each
    /// name may appear once.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first offending
    /// range or pair.
    pub fn validate(&self) -> Result<(), PipelineError> {
        for r in &self.0 {
            if (0..3).any(|c| r.min[c] >= i16::from(r.max[c])) {
                return Err(PipelineError::InvalidConfig(format!(
                    "range {} admits no colour (min {:?}, max {:?})",
                    r.name, r.min, r.max,
                )));
            }
        }
        for (i, a) in self.0.iter().enumerate() {
            for b in &self.0[i + 1..] {
                if a.name == b.name {
                    return Err(PipelineError::InvalidConfig(format!(
                        "range {} is configured more than once",
                        a.name,
                    )));
                }
                if a.overlaps(b) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "ranges {} and {} overlap",
                        a.name, b.name,
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for ColorRanges {
    fn default() -> Self {
        Self(vec![
            // Greys down to about #e0e0e0 count as paper.
            ColorRange {
                name: RangeName::NearWhite,
                min: [0xdf, 0xe3, 0xe2],
                max: [0xff, 0xff, 0xff],
                replace: false,
                canonical: WHITE.0,
            },
            ColorRange {
                name: RangeName::Marker,
                min: [0xc0, 0xb9, 0x02],
                max: [0xfe, 0xff, 0xaf],
                replace: false,
                canonical: MARKER_RECOLOR.0,
            },
            ColorRange {
                name: RangeName::NearBlack,
                min: [-1, -1, -1],
                max: [0x39, 0x39, 0x39],
                replace: false,
                canonical: BLACK.0,
            },
        ])
    }
}
