//! Callout composer: the production summary panel stamped onto the
//! baseline.
//!
//! The panel is sized as a fraction of the target image and grows by a
//! fixed increment for every production unit beyond the first. Layout
//! state lives on the [`Callout`] builder and is created fresh per run.

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::canvas::PixelBuffer;
use crate::color::{BLACK, WHITE};
use crate::font::draw_text;
use crate::production::Production;
use crate::types::{Dimensions, Pixel};

/// Canvas size as a fraction of the target image, per axis.
pub const CANVAS_FRACTION: f64 = 0.05;
/// Date label position as fractions of the canvas width and height.
pub const DATE_POSITION: (f64, f64) = (0.3, 0.281_25);
/// Unit box size as fractions of the canvas width and height.
pub const BOX_SIZE: (f64, f64) = (0.875, 0.333);
/// First unit box corner as fractions of the canvas width and height.
pub const BOX_POSITION: (f64, f64) = (0.0625, 0.4167);
/// Unit label position as multiples of the first box corner.
pub const BOX_TEXT_SCALE: (f64, f64) = (1.1429, 1.525);
/// Canvas growth per extra unit, as a multiple of the box height.
pub const GROWTH_SCALE: f64 = 1.15;
/// Vertical distance between unit boxes, as a multiple of the box height.
pub const GAP_SCALE: f64 = 1.25;

/// Horizontal label nudge by text length: for the first row whose bound
/// exceeds the length, the nudge is `base - len`. Longer text gets none.
///
/// Lengths up to 11 fall in the first row.
pub const TEXT_NUDGE: [(usize, i64); 4] = [(12, 10), (15, 25), (17, 35), (25, 30)];

/// Nudge applied to a label of `len` bytes.
#[must_use]
pub fn text_nudge(len: usize) -> i64 {
    TEXT_NUDGE
        .iter()
        .find(|(bound, _)| len < *bound)
        .map_or(0, |&(_, base)| base - i64::try_from(len).unwrap_or(base))
}

/// `round(value * factor)`, rounding half away from zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn scaled(value: i64, factor: f64) -> i64 {
    (value as f64 * factor).round() as i64
}

/// Base geometry derived from the target image size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalloutLayout {
    /// Canvas width.
    pub width: i64,
    /// Canvas height before growth.
    pub height: i64,
    /// Date label baseline origin.
    pub date: Pixel,
    /// Unit box width.
    pub box_width: i64,
    /// Unit box height.
    pub box_height: i64,
    /// Extra canvas height per unit beyond the first.
    pub growth: i64,
    /// Vertical offset between consecutive boxes.
    pub gap: i64,
    /// Top-left corner of the first box.
    pub first_box: Pixel,
    /// Label baseline origin inside the first box, before nudging.
    pub first_text: Pixel,
}

impl CalloutLayout {
    /// Compute the layout for a target image.
    #[must_use]
    pub fn for_target(target: Dimensions) -> Self {
        let width = scaled(i64::from(target.width), CANVAS_FRACTION);
        let height = scaled(i64::from(target.height), CANVAS_FRACTION);
        let box_width = scaled(width, BOX_SIZE.0);
        let box_height = scaled(height, BOX_SIZE.1);
        let first_box = Pixel::new(scaled(width, BOX_POSITION.0), scaled(height, BOX_POSITION.1));
        Self {
            width,
            height,
            date: Pixel::new(scaled(width, DATE_POSITION.0), scaled(height, DATE_POSITION.1)),
            box_width,
            box_height,
            growth: scaled(box_height, GROWTH_SCALE),
            gap: scaled(box_height, GAP_SCALE),
            first_box,
            first_text: Pixel::new(
                scaled(first_box.x, BOX_TEXT_SCALE.0),
                scaled(first_box.y, BOX_TEXT_SCALE.1),
            ),
        }
    }

    /// Canvas height for `units` production units.
    #[must_use]
    pub fn height_for(&self, units: usize) -> i64 {
        let extra = i64::try_from(units.saturating_sub(1)).unwrap_or(0);
        self.height + extra * self.growth
    }
}

/// Builder for one callout panel.
#[derive(Debug, Clone)]
pub struct Callout {
    layout: CalloutLayout,
    /// Inclusive corner of the outer frame.
    frame_end: Pixel,
    /// Top-left corner of the most recent box.
    box_origin: Pixel,
    /// Label origin of the most recent box.
    text_origin: Pixel,
    boxes: usize,
    canvas: RgbaImage,
}

impl Callout {
    /// Allocate a blank canvas sized for `units` boxes on `target`.
    #[must_use]
    pub fn new(target: Dimensions, units: usize) -> Self {
        let layout = CalloutLayout::for_target(target);
        let height = layout.height_for(units);
        let canvas = RgbaImage::new(
            u32::try_from(layout.width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
        );
        Self {
            layout,
            frame_end: Pixel::new(layout.width - 1, height - 1),
            box_origin: layout.first_box,
            text_origin: layout.first_text,
            boxes: 0,
            canvas,
        }
    }

    /// Build the complete panel for `production`.
    #[must_use]
    pub fn compose(production: &Production, target: Dimensions) -> Self {
        let mut callout = Self::new(target, production.units.len());
        callout.draw_frame(&production.date);
        for unit in &production.units {
            callout.add_unit_box(&unit.text, unit.fill());
        }
        debug!(
            width = callout.canvas.width(),
            height = callout.canvas.height(),
            units = callout.boxes,
            "callout composed"
        );
        callout
    }

    /// White background, double border, and the date label.
    pub fn draw_frame(&mut self, date: &str) {
        let end = self.frame_end;
        fill(&mut self.canvas, Pixel::ORIGIN, end, WHITE);
        double_outline(&mut self.canvas, Pixel::ORIGIN, end);
        draw_text(&mut self.canvas, self.layout.date, date, BLACK);
    }

    /// Append one filled, bordered, labelled box below the previous one.
    pub fn add_unit_box(&mut self, text: &str, color: Rgba<u8>) {
        if self.boxes > 0 {
            self.box_origin.y += self.layout.gap;
            self.text_origin.y += self.layout.gap;
        }
        // Cumulative across boxes.
        self.text_origin.x += text_nudge(text.len());

        let start = self.box_origin;
        let end = Pixel::new(
            start.x + self.layout.box_width,
            start.y + self.layout.box_height,
        );
        fill(&mut self.canvas, start, end, color);
        double_outline(&mut self.canvas, start, end);
        draw_text(&mut self.canvas, self.text_origin, text, BLACK);
        self.boxes += 1;
    }

    /// The layout this callout was built from.
    #[must_use]
    pub const fn layout(&self) -> &CalloutLayout {
        &self.layout
    }

    /// Number of unit boxes added so far.
    #[must_use]
    pub const fn boxes(&self) -> usize {
        self.boxes
    }

    /// The panel pixels.
    #[must_use]
    pub const fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    /// Where the panel lands on a target image: three quarters across
    /// and half way down, using integer division.
    #[must_use]
    pub fn placement(target: Dimensions) -> Pixel {
        let w = i64::from(target.width);
        let h = i64::from(target.height);
        Pixel::new(w / 2 + w / 4, h / 2)
    }

    /// Copy the panel onto `target` at [`placement`](Self::placement),
    /// overwriting and clipping. Returns the placement.
    pub fn composite_onto<B: PixelBuffer>(&self, target: &mut B) -> Pixel {
        let origin = Self::placement(target.dimensions());
        for (x, y, px) in self.canvas.enumerate_pixels() {
            target.write_at(
                Pixel::new(origin.x + i64::from(x), origin.y + i64::from(y)),
                *px,
            );
        }
        origin
    }
}

/// Rect covering `[start, end)`, or `None` if empty or off-range.
fn rect_between(start: Pixel, end: Pixel) -> Option<Rect> {
    let width = u32::try_from(end.x - start.x).ok().filter(|w| *w > 0)?;
    let height = u32::try_from(end.y - start.y).ok().filter(|h| *h > 0)?;
    let x = i32::try_from(start.x).ok()?;
    let y = i32::try_from(start.y).ok()?;
    Some(Rect::at(x, y).of_size(width, height))
}

/// Fill the half-open region `[start, end)`.
fn fill(canvas: &mut RgbaImage, start: Pixel, end: Pixel, color: Rgba<u8>) {
    if let Some(rect) = rect_between(start, end) {
        draw_filled_rect_mut(canvas, rect, color);
    }
}

/// Two nested one-pixel borders; `end` is inclusive.
fn double_outline(canvas: &mut RgbaImage, start: Pixel, end: Pixel) {
    for inset in 0..2 {
        let a = Pixel::new(start.x + inset, start.y + inset);
        let b = Pixel::new(end.x - inset + 1, end.y - inset + 1);
        if let Some(rect) = rect_between(a, b) {
            draw_hollow_rect_mut(canvas, rect, BLACK);
        }
    }
}
