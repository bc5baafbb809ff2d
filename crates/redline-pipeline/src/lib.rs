//! redline-pipeline: transfer hand-marked annotations between scans (sans-IO).
//!
//! Takes an annotated "redline" scan and a "running" baseline scan of the
//! same drawing and:
//! clean -> extract marker -> anchor -> reconstruct lines ->
//! composite callout -> rasterize lines.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! pixel buffers. Decoding, encoding and atomic saves live in
//! `redline-io`.

pub mod anchor;
pub mod callout;
pub mod canvas;
pub mod color;
pub mod font;
pub mod production;
pub mod progress;
pub mod raster;
pub mod reconstruct;
pub mod scan;
pub mod types;

use image::Rgba;
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

pub use callout::Callout;
pub use canvas::PixelBuffer;
pub use color::{ColorRange, ColorRanges, RangeName, ScanPass};
pub use production::{Production, ProductionUnit, Quantities};
pub use progress::{ConsoleProgress, ProgressSink};
pub use reconstruct::{PointStats, Reconstruction};
pub use scan::ScanResult;
pub use types::{
    Dimensions, Line, LineSet, Offset, PipelineConfig, PipelineError, Pixel, RgbaImage, WuTuning,
};

/// Summary of one transfer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Redline image size.
    pub redline: Dimensions,
    /// Baseline image size.
    pub baseline: Dimensions,
    /// Registration anchor found on the redline.
    pub redline_anchor: Pixel,
    /// Registration anchor found on the baseline.
    pub baseline_anchor: Pixel,
    /// Number of marker pixels extracted from the redline.
    pub marker_pixels: usize,
    /// Line reconstruction details.
    pub reconstruction: Reconstruction,
    /// Number of lines rasterized onto the baseline.
    pub lines_drawn: usize,
    /// Top-left corner of the callout on the baseline.
    pub callout_origin: Pixel,
    /// Callout canvas size.
    pub callout_size: Dimensions,
}

/// Outcome of preparing the redline: where the marker strokes were and
/// where the registration anchor is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedlineMarks {
    /// Marker pixel coordinates in raster order.
    pub marker: Vec<Pixel>,
    /// Registration anchor.
    pub anchor: Pixel,
}

/// Clean the redline and extract its marker strokes.
///
/// Runs a clean pass (near-white to white, near-black to black), then a
/// marker pass that recolours marker pixels and records their
/// coordinates, then locates the anchor. `redline` is modified in place
/// and is suitable for saving afterwards.
pub fn prepare_redline<B: PixelBuffer>(redline: &mut B, ranges: &ColorRanges) -> RedlineMarks {
    let _span = info_span!("redline").entered();
    scan::scan(redline, &ranges.for_pass(ScanPass::Clean), true);
    let extracted = scan::scan(redline, &ranges.for_pass(ScanPass::ExtractMarker), true);
    let marker = extracted.changed(RangeName::Marker).to_vec();
    let anchor = anchor::anchor_or_origin(redline, ranges);
    debug!(marker = marker.len(), ?anchor, "redline prepared");
    RedlineMarks { marker, anchor }
}

/// Run the full transfer.
///
/// Both images are modified in place: the redline is cleaned and its
/// marker strokes recoloured; the baseline is cleaned and receives the
/// callout and the reconstructed lines.
///
/// # Pipeline steps
///
/// 1. Validate the colour ranges
/// 2. Prepare the redline ([`prepare_redline`])
/// 3. Clean the baseline and find its anchor
/// 4. Compose the callout and composite it
/// 5. Reconstruct lines against the baseline, callout included
/// 6. Rasterize every line past the skip count
///
/// Progress is announced through `progress`, or on the console when it
/// is `None`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if the colour ranges are
/// contradictory. Nothing is modified in that case.
pub fn transfer<B: PixelBuffer>(
    redline: &mut B,
    baseline: &mut B,
    production: &Production,
    config: &PipelineConfig,
    progress: Option<&dyn ProgressSink>,
) -> Result<TransferReport, PipelineError> {
    // 1. Validate.
    config.validate()?;

    // 2. Redline.
    progress::report(progress, "Pre-processing redline and running images ..");
    let marks = prepare_redline(redline, &config.ranges);
    progress::report(
        progress,
        &format!("Redline cleaned; {} marker pixels found.", marks.marker.len()),
    );

    // 3. Baseline.
    let baseline_anchor = {
        let _span = info_span!("baseline").entered();
        scan::scan(baseline, &config.ranges.for_pass(ScanPass::Clean), true);
        anchor::anchor_or_origin(baseline, &config.ranges)
    };

    // 4. Callout.
    progress::report(progress, "Creating callout box ..");
    let target = baseline.dimensions();
    let callout = Callout::compose(production, target);
    let callout_origin = callout.composite_onto(baseline);

    // 5. Reconstruct. The callout's frame and text are snap targets too.
    let reconstruction = reconstruct::reconstruct(
        &marks.marker,
        marks.anchor,
        baseline_anchor,
        baseline,
        config,
    );

    // 6. Lines.
    progress::report(progress, "Drawing lines on running image ..");
    let lines_drawn = raster::draw_lines(
        baseline,
        &reconstruction.lines,
        config.skip_lines,
        Rgba(config.line_color),
        config.wu,
    );

    progress::report(
        progress,
        &format!(
            "Transfer complete: {lines_drawn} of {} lines drawn.",
            reconstruction.lines.len()
        ),
    );

    Ok(TransferReport {
        redline: redline.dimensions(),
        baseline: target,
        redline_anchor: marks.anchor,
        baseline_anchor,
        marker_pixels: marks.marker.len(),
        reconstruction,
        lines_drawn,
        callout_origin,
        callout_size: Dimensions::of(callout.canvas()),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::color::{BLACK, MARKER_RECOLOR, WHITE};

    const HIGHLIGHT: Rgba<u8> = Rgba([250, 235, 80, 255]);
    const PAPER: Rgba<u8> = Rgba([242, 240, 239, 255]);

    fn production() -> Production {
        Production::from_quantities(
            "06/01/2024",
            &Quantities {
                strand: 120.0,
                ..Quantities::default()
            },
        )
    }

    #[test]
    fn prepare_redline_cleans_and_extracts() {
        let mut redline = RgbaImage::from_pixel(30, 30, PAPER);
        redline.put_pixel(5, 5, HIGHLIGHT);
        redline.put_pixel(6, 6, HIGHLIGHT);
        redline.put_pixel(28, 27, Rgba([20, 20, 20, 255]));

        let marks = prepare_redline(&mut redline, &ColorRanges::default());
        assert_eq!(marks.marker, vec![Pixel::new(5, 5), Pixel::new(6, 6)]);
        assert_eq!(marks.anchor, Pixel::new(28, 27));
        assert_eq!(*redline.get_pixel(0, 0), WHITE);
        assert_eq!(*redline.get_pixel(5, 5), MARKER_RECOLOR);
        assert_eq!(*redline.get_pixel(28, 27), BLACK);
    }

    #[test]
    fn transfer_rejects_overlapping_ranges_without_touching_images() {
        let mut ranges = ColorRanges::default().ranges().to_vec();
        ranges[1].min = [-1, -1, -1];
        let config = PipelineConfig {
            ranges: ColorRanges::new(ranges),
            ..PipelineConfig::default()
        };
        let mut redline = RgbaImage::from_pixel(10, 10, PAPER);
        let mut baseline = redline.clone();
        let before = redline.clone();

        let quiet = |_: &str| {};
        let result = transfer(
            &mut redline,
            &mut baseline,
            &production(),
            &config,
            Some(&quiet),
        );
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
        assert_eq!(redline, before);
        assert_eq!(baseline, before);
    }

    #[test]
    fn transfer_reports_milestones_in_order() {
        let seen = RefCell::new(Vec::new());
        let sink = |m: &str| seen.borrow_mut().push(m.to_string());
        let mut redline = RgbaImage::from_pixel(40, 40, WHITE);
        let mut baseline = RgbaImage::from_pixel(40, 40, WHITE);

        transfer(
            &mut redline,
            &mut baseline,
            &production(),
            &PipelineConfig::default(),
            Some(&sink),
        )
        .unwrap();

        let seen = seen.into_inner();
        assert_eq!(seen.len(), 5);
        assert!(seen[0].starts_with("Pre-processing"));
        assert!(seen[2].starts_with("Creating callout"));
        assert!(seen[3].starts_with("Drawing lines"));
        assert!(seen[4].starts_with("Transfer complete"));
    }

    #[test]
    fn transfer_without_anchor_falls_back_to_origin() {
        let mut redline = RgbaImage::from_pixel(40, 40, WHITE);
        let mut baseline = RgbaImage::from_pixel(40, 40, WHITE);
        let report = transfer(
            &mut redline,
            &mut baseline,
            &production(),
            &PipelineConfig::default(),
            Some(&|_: &str| {}),
        )
        .unwrap();
        assert_eq!(report.redline_anchor, Pixel::ORIGIN);
        assert_eq!(report.baseline_anchor, Pixel::ORIGIN);
        assert_eq!(report.marker_pixels, 0);
        assert_eq!(report.lines_drawn, 0);
        assert_eq!(report.callout_origin, Pixel::new(30, 20));
    }

    #[test]
    fn transfer_report_serializes() {
        let mut redline = RgbaImage::from_pixel(20, 20, WHITE);
        let mut baseline = RgbaImage::from_pixel(20, 20, WHITE);
        let report = transfer(
            &mut redline,
            &mut baseline,
            &production(),
            &PipelineConfig::default(),
            Some(&|_: &str| {}),
        )
        .unwrap();
        let json = serde_json::to_string(&report).unwrap();
        let back: TransferReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
