//! Error types for image file I/O.

use std::path::PathBuf;

/// Errors that can occur while reading or writing image files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The file could not be opened or read.
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file was read but is not a decodable image.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Encoding the image into the temporary file failed.
    #[error("failed to encode {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// The temporary file could not be created, synced, or renamed
    /// into place.
    #[error("failed to save {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The destination extension names no format we can write.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),
}
