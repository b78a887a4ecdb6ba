// Evaluation error types (cross-validation, classifiers, metrics)

use crate::error::ErrorCode;
use log::error;
use thiserror::Error;

/// Log an evaluation error with structured context
pub fn log_evaluation_error(err: &EvaluationError, context: &str) {
    error!(
        "Evaluation error in {}: code={}, component=CrossValidationEngine, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Errors raised while splitting, fitting or scoring
///
/// Error code range: 3001-3006
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Classifier id is not part of the catalog
    #[error("Unknown classifier '{id}' (expected one of knn, svm, dt, rf, gb)")]
    UnknownClassifier { id: String },

    /// A class has fewer examples than folds
    #[error("Insufficient samples: class {class} has {count} examples, need at least {k_fold}")]
    InsufficientSamples {
        class: usize,
        count: usize,
        k_fold: usize,
    },

    /// Feature matrix and labels (or probabilities) disagree in shape
    #[error("Shape mismatch: {context} (expected {expected}, got {actual})")]
    ShapeMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// Nothing to evaluate
    #[error("Feature table is empty")]
    EmptyFeatureTable,

    /// A metric is undefined for the given labels
    #[error("Metric {metric} is undefined: {reason}")]
    UndefinedMetric {
        metric: &'static str,
        reason: String,
    },

    /// Stratified splitting needs at least two folds
    #[error("Invalid fold count {k_fold}: need at least 2")]
    InvalidFoldCount { k_fold: usize },
}

impl EvaluationError {
    pub fn shape_mismatch<S: Into<String>>(context: S, expected: usize, actual: usize) -> Self {
        EvaluationError::ShapeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }
}

impl ErrorCode for EvaluationError {
    fn code(&self) -> i32 {
        match self {
            EvaluationError::UnknownClassifier { .. } => 3001,
            EvaluationError::InsufficientSamples { .. } => 3002,
            EvaluationError::ShapeMismatch { .. } => 3003,
            EvaluationError::EmptyFeatureTable => 3004,
            EvaluationError::UndefinedMetric { .. } => 3005,
            EvaluationError::InvalidFoldCount { .. } => 3006,
        }
    }

    fn message(&self) -> String {
        self.to_string()
    }
}
