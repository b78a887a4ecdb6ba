// Dataset construction error types

use crate::error::{ErrorCode, PreprocessingError};
use log::error;
use thiserror::Error;

/// Log a dataset error with structured context
pub fn log_dataset_error(err: &DatasetError, context: &str) {
    error!(
        "Dataset error in {}: code={}, component=DatasetBuilder, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while assembling a feature table
///
/// A single failing recording aborts the table for that frequency.
///
/// Error code range: 2001-2002
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// Preprocessing failed for one recording
    #[error("Recording {recording} at {frequency_hz} Hz: {source}")]
    Recording {
        recording: String,
        frequency_hz: u32,
        #[source]
        source: PreprocessingError,
    },

    /// No recordings were supplied
    #[error("No recordings supplied for {frequency_hz} Hz")]
    NoRecordings { frequency_hz: u32 },
}

impl ErrorCode for DatasetError {
    fn code(&self) -> i32 {
        match self {
            DatasetError::Recording { .. } => 2001,
            DatasetError::NoRecordings { .. } => 2002,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
