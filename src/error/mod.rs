// Error types for the fall detection benchmark
//
// This module defines one error enum per pipeline area, each carrying a
// numeric error code so that reports and exit statuses can be keyed on them.

mod acquisition;
mod dataset;
mod evaluation;
mod preprocessing;

pub use acquisition::{log_acquisition_error, AcquisitionError};
pub use dataset::{log_dataset_error, DatasetError};
pub use evaluation::{log_evaluation_error, EvaluationError};
pub use preprocessing::{log_preprocessing_error, PreprocessingError};

use thiserror::Error;

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

/// Top-level error returned by the experiment orchestration
#[derive(Debug, Error)]
pub enum BenchError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// Configuration rejected by validation
    #[error("Invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),
}

impl ErrorCode for BenchError {
    fn code(&self) -> i32 {
        match self {
            BenchError::Acquisition(err) => err.code(),
            BenchError::Preprocessing(err) => err.code(),
            BenchError::Dataset(err) => err.code(),
            BenchError::Evaluation(err) => err.code(),
            BenchError::InvalidConfig(_) => 5001,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
