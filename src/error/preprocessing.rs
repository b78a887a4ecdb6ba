// Preprocessing error types (trimming, resampling, segmentation)

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Log a preprocessing error with structured context
pub fn log_preprocessing_error(err: &PreprocessingError, context: &str) {
    error!(
        "Preprocessing error in {}: code={}, component=Preprocessing, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while trimming, resampling or segmenting a signal
///
/// Error code range: 1001-1006
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreprocessingError {
    /// Requested duration maps to no samples or to more samples than available
    #[error("Invalid duration {duration_ms} ms: needs {target_count} samples, signal has {available}")]
    InvalidDuration {
        duration_ms: f64,
        target_count: i64,
        available: usize,
    },

    /// Target sampling frequency is not strictly positive
    #[error("Invalid sampling frequency {frequency_hz} Hz")]
    InvalidFrequency { frequency_hz: f64 },

    /// The event segment would contain no samples
    #[error("Degenerate segment: event range [{low}, {high}) in a signal of {len} samples")]
    DegenerateSegment { low: usize, high: usize, len: usize },

    /// The signal contains no samples at all
    #[error("Signal contains no samples")]
    EmptySignal,

    /// Channel names and data columns disagree
    #[error("Channel mismatch: {names} channel names for {columns} data columns")]
    ChannelMismatch { names: usize, columns: usize },

    /// Timestamps missing, out of order, or with a non-positive period
    #[error("Invalid timestamps: {reason}")]
    InvalidTimestamps { reason: String },
}

impl ErrorCode for PreprocessingError {
    fn code(&self) -> i32 {
        match self {
            PreprocessingError::InvalidDuration { .. } => 1001,
            PreprocessingError::InvalidFrequency { .. } => 1002,
            PreprocessingError::DegenerateSegment { .. } => 1003,
            PreprocessingError::EmptySignal => 1004,
            PreprocessingError::ChannelMismatch { .. } => 1005,
            PreprocessingError::InvalidTimestamps { .. } => 1006,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
