// Acquisition error types (dataset discovery and file parsing)

use std::path::PathBuf;

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Log an acquisition error with structured context
pub fn log_acquisition_error(err: &AcquisitionError, context: &str) {
    error!(
        "Acquisition error in {}: code={}, component=Acquisition, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while reading recordings from disk
///
/// Error code range: 4001-4004
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// Underlying file system failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed row or value in a recording file
    #[error("Parse error in {path:?} at row {row}: {reason}")]
    Parse {
        path: PathBuf,
        row: usize,
        reason: String,
    },

    /// Sensor axis index outside 0..=8
    #[error("Invalid sensor axis index {index}")]
    InvalidAxis { index: usize },

    /// Dataset root produced no recordings
    #[error("No recordings found under {root:?}")]
    EmptyDataset { root: PathBuf },
}

impl AcquisitionError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AcquisitionError::Io {
            path: path.into(),
            source,
        }
    }
}

impl ErrorCode for AcquisitionError {
    fn code(&self) -> i32 {
        match self {
            AcquisitionError::Io { .. } => 4001,
            AcquisitionError::Parse { .. } => 4002,
            AcquisitionError::InvalidAxis { .. } => 4003,
            AcquisitionError::EmptyDataset { .. } => 4004,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
