//! redline-io: filesystem I/O for the redline transfer.
//!
//! Decodes scans into RGBA buffers, saves results with an
//! encode-to-temporary-then-rename step so a failed save never leaves a
//! half-written file, and names the output files.

pub mod error;
pub mod files;
pub mod paths;

pub use error::IoError;
pub use files::{load_rgba, save_atomic};
pub use paths::{preprocessed_redline_path, running_output_path};
