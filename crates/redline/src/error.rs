//! Errors surfaced to the command-line user.

use std::path::PathBuf;

use redline_io::IoError;
use redline_pipeline::PipelineError;

/// Everything that can stop a run. Printed verbatim to stderr.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// An input image path does not exist.
    #[error("provided {role} file path '{}' does not exist", path.display())]
    MissingFile { role: &'static str, path: PathBuf },

    /// An input image is not a `.png`.
    #[error("incorrect {role} file type '{}': only .png is allowed", path.display())]
    NotPng { role: &'static str, path: PathBuf },

    /// The job number names no known program.
    #[error("invalid job number '{0}': expected DYEA_LSA_... or VZ_LAN_...")]
    InvalidJob(String),

    /// The work-performed date is not `MM/DD/YYYY`.
    #[error("invalid work performed date '{0}': expected MM/DD/YYYY")]
    InvalidDate(String),

    /// A quantity is negative or not a number.
    #[error("invalid quantity given for {code}: {value}")]
    InvalidQuantity { code: &'static str, value: f64 },

    /// `--config-json` did not parse.
    #[error("error parsing --config-json: {0}")]
    ConfigJson(serde_json::Error),

    /// The report could not be serialized.
    #[error("error serializing report: {0}")]
    Report(serde_json::Error),

    /// The background worker could not be started.
    #[error("failed to start worker thread: {0}")]
    Spawn(std::io::Error),

    /// The background worker panicked.
    #[error("transfer worker panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Io(#[from] IoError),
}
