//! Integration tests: save and reload images through the filesystem.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use image::{Rgba, RgbaImage};
use redline_io::{IoError, load_rgba, preprocessed_redline_path, save_atomic};

fn sample() -> RgbaImage {
    RgbaImage::from_fn(16, 9, |x, y| {
        let r = u8::try_from(x * 15).unwrap();
        let g = u8::try_from(y * 25).unwrap();
        Rgba([r, g, 100, 255])
    })
}

#[test]
fn png_save_is_lossless() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    save_atomic(&sample(), &path).expect("save should succeed");
    let loaded = load_rgba(&path).expect("load should succeed");
    assert_eq!(loaded, sample());
}

#[test]
fn jpeg_save_keeps_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jpg");
    save_atomic(&sample(), &path).unwrap();
    let loaded = load_rgba(&path).unwrap();
    assert_eq!(loaded.dimensions(), (16, 9));
}

#[test]
fn save_replaces_existing_file_and_leaves_no_temporaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("running.png");
    save_atomic(&RgbaImage::new(2, 2), &path).unwrap();
    save_atomic(&sample(), &path).unwrap();
    assert_eq!(load_rgba(&path).unwrap(), sample());

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn unsupported_extension_leaves_destination_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.tiff");
    std::fs::write(&path, b"keep me").unwrap();

    let err = save_atomic(&sample(), &path).unwrap_err();
    assert!(matches!(err, IoError::UnsupportedFormat(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
}

#[test]
fn preprocessed_redline_creates_edits_dir() {
    let dir = tempfile::tempdir().unwrap();
    let redline = dir.path().join("job_7.png");
    let target = preprocessed_redline_path(&redline);
    assert!(!target.parent().unwrap().exists());

    save_atomic(&sample(), &target).unwrap();
    assert!(dir.path().join("edits").join("job_7_PREPROCESS.png").is_file());
}

#[test]
fn missing_file_is_an_open_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_rgba(&dir.path().join("nope.png")).unwrap_err();
    assert!(matches!(err, IoError::Open { .. }));
    assert!(err.to_string().contains("nope.png"));
}

#[test]
fn garbage_is_a_decode_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.png");
    std::fs::write(&path, b"definitely not an image").unwrap();
    assert!(matches!(load_rgba(&path), Err(IoError::Decode { .. })));
}
