//! Antialiased line rasterization (Xiaolin Wu).
//!
//! Each step of the algorithm produces a pixel pair straddling the ideal
//! line with a fractional coverage weight. The pair is plotted as:
//!
//! * the primary pixel is set to the line colour outright;
//! * the secondary pixel receives the line colour blended over the
//!   primary pixel's *previous* colour, with the weight boosted by
//!   [`WuTuning::coverage_boost`] (capped at 1.0) and then
//!   [`WuTuning::blend_boost`].
//!
//! Those boosts are calibration values; the output is pinned to them.
//! Writes that fall outside the buffer are dropped.

use image::Rgba;
use tracing::{debug, instrument};

use crate::canvas::PixelBuffer;
use crate::types::{Line, Pixel, WuTuning};

/// Colour read for a pixel outside the buffer.
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Fractional part of `v` (always in `[0, 1)`).
#[must_use]
pub fn mantissa(v: f64) -> f64 {
    v - v.floor()
}

/// Linearly interpolate from `base` toward `target` by `weight`.
///
/// `weight` is clamped to `[0, 1]`. Channels are truncated, not
/// rounded, and alpha is taken from `target`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn weighted_color(base: Rgba<u8>, target: Rgba<u8>, weight: f64) -> Rgba<u8> {
    let w = weight.clamp(0.0, 1.0);
    let mix = |b: u8, t: u8| {
        let b = f64::from(b);
        (b + (f64::from(t) - b) * w) as u8
    };
    Rgba([
        mix(base[0], target[0]),
        mix(base[1], target[1]),
        mix(base[2], target[2]),
        target[3],
    ])
}

/// Plot one coverage pair.
fn plot<B: PixelBuffer>(
    buf: &mut B,
    primary: Pixel,
    secondary: Pixel,
    color: Rgba<u8>,
    weight: f64,
    tuning: WuTuning,
) {
    let weight = (weight * tuning.coverage_boost).min(1.0);
    let previous = buf.read_at(primary).unwrap_or(TRANSPARENT);
    let blended = weighted_color(previous, color, weight * tuning.blend_boost);
    buf.write_at(primary, color);
    buf.write_at(secondary, blended);
}

/// Draw an antialiased line from `start` to `end`.
///
/// Steep lines (more vertical than horizontal) are walked along Y.
/// A zero-length line still plots its endpoint pairs.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn draw_antialiased<B: PixelBuffer>(
    buf: &mut B,
    start: Pixel,
    end: Pixel,
    color: Rgba<u8>,
    tuning: WuTuning,
) {
    let (mut x1, mut y1) = (start.x as f64, start.y as f64);
    let (mut x2, mut y2) = (end.x as f64, end.y as f64);

    let steep = (y2 - y1).abs() > (x2 - x1).abs();
    if steep {
        std::mem::swap(&mut x1, &mut y1);
        std::mem::swap(&mut x2, &mut y2);
    }
    if x1 > x2 {
        std::mem::swap(&mut x1, &mut x2);
        std::mem::swap(&mut y1, &mut y2);
    }

    let dx = x2 - x1;
    let dy = y2 - y1;
    let gradient = if dx.abs() < f64::EPSILON { 1.0 } else { dy / dx };

    // (major, minor) in walk space to image space.
    let at = |major: f64, minor: f64| {
        let (major, minor) = (major as i64, minor as i64);
        if steep {
            Pixel::new(minor, major)
        } else {
            Pixel::new(major, minor)
        }
    };
    let pair = |buf: &mut B, major: f64, minor: f64, weight: f64| {
        plot(
            buf,
            at(major, minor),
            at(major, minor + 1.0),
            color,
            weight,
            tuning,
        );
    };

    // First endpoint.
    let xend = (x1 + 0.5).floor();
    let yend = y1 + gradient * (xend - x1);
    let xgap = 1.0 - mantissa(x1 + 0.5);
    let xpixel1 = xend;
    pair(buf, xpixel1, yend.floor(), mantissa(yend) * xgap);
    let mut intersect = yend + gradient;

    // Second endpoint.
    let xend = (x2 + 0.5).floor();
    let yend = y2 + gradient * (xend - x2);
    let xgap = mantissa(x2 + 0.5);
    let xpixel2 = xend;
    pair(buf, xpixel2, yend.floor(), mantissa(yend) * xgap);

    // Interior.
    for major in (xpixel1 as i64 + 1)..(xpixel2 as i64) {
        pair(buf, major as f64, intersect.floor(), mantissa(intersect));
        intersect += gradient;
    }
}

/// Draw every line from index `skip` onward, first pixel to last.
///
/// Returns the number of lines drawn.
#[instrument(skip_all, fields(lines = lines.len(), skipped = skip))]
pub fn draw_lines<B: PixelBuffer>(
    buf: &mut B,
    lines: &[Line],
    skip: usize,
    color: Rgba<u8>,
    tuning: WuTuning,
) -> usize {
    let mut drawn = 0;
    for line in lines.iter().skip(skip) {
        draw_antialiased(buf, line.start(), line.end(), color, tuning);
        drawn += 1;
    }
    debug!(drawn, "lines rasterized");
    drawn
}
