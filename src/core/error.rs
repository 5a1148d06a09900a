// src/core/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy of the scan controller.
///
/// Only `Coordinator` ever aborts a run. Every other variant is recovered
/// locally and ends up as a per-target outcome or a run warning.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("host resource metrics unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("scan of {target} timed out after {elapsed_secs:.1}s")]
    TaskTimeout { target: String, elapsed_secs: f64 },

    #[error("scan of {target} failed: {reason}")]
    TaskFailed { target: String, reason: String },

    #[error("host overloaded: {0}")]
    Overloaded(String),

    #[error("invalid target '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("unparseable findings file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scan coordinator could not start: {0}")]
    Coordinator(String),
}

pub type Result<T> = std::result::Result<T, ScanError>;
