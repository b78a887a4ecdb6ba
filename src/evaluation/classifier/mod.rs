// Classifier catalog - the fixed family of models being benchmarked
//
// Every family implements `Classifier` over ndarray matrices. A classifier
// is built fresh (unfitted, default hyperparameters) for every fold via
// `ClassifierKind::build`, so fitted state never crosses fold boundaries.

mod boosting;
mod forest;
mod knn;
mod svm;
mod tree;

pub use boosting::GradientBoosting;
pub use forest::RandomForest;
pub use knn::KNearestNeighbors;
pub use svm::SupportVectorMachine;
pub use tree::{DecisionTree, MaxFeatures};

use std::fmt;
use std::str::FromStr;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Probabilistic multi-class classifier
pub trait Classifier: Send + Sync {
    /// Fit on a training partition
    ///
    /// # Arguments
    /// * `x` - Training features (rows = examples)
    /// * `y` - Class id per row, each `< n_classes`
    /// * `n_classes` - Width of the probability matrix
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[usize], n_classes: usize)
        -> Result<(), EvaluationError>;

    /// Class probabilities per row; columns are class ids, rows sum to 1
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError>;

    /// Number of probability columns (0 before fitting)
    fn n_classes(&self) -> usize;
}

/// Classifier family identifier
///
/// Deserialised through `FromStr`, so an unknown id reports
/// `UnknownClassifier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum ClassifierKind {
    #[serde(rename = "knn")]
    Knn,
    #[serde(rename = "svm")]
    Svm,
    #[serde(rename = "dt")]
    DecisionTree,
    #[serde(rename = "rf")]
    RandomForest,
    #[serde(rename = "gb")]
    GradientBoosting,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 5] = [
        ClassifierKind::Knn,
        ClassifierKind::Svm,
        ClassifierKind::DecisionTree,
        ClassifierKind::RandomForest,
        ClassifierKind::GradientBoosting,
    ];

    /// Short id used in configuration and reports
    pub fn abbreviation(self) -> &'static str {
        match self {
            ClassifierKind::Knn => "knn",
            ClassifierKind::Svm => "svm",
            ClassifierKind::DecisionTree => "dt",
            ClassifierKind::RandomForest => "rf",
            ClassifierKind::GradientBoosting => "gb",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ClassifierKind::Knn => "k-Nearest Neighbour",
            ClassifierKind::Svm => "Support Vector Machines",
            ClassifierKind::DecisionTree => "Decision Tree",
            ClassifierKind::RandomForest => "Random Forest",
            ClassifierKind::GradientBoosting => "Gradient Boosting",
        }
    }

    /// Construct a fresh, unfitted classifier with default hyperparameters
    ///
    /// # Arguments
    /// * `seed` - Seed for any randomised training step
    pub fn build(self, seed: u64) -> Box<dyn Classifier> {
        match self {
            ClassifierKind::Knn => Box::new(KNearestNeighbors::default()),
            ClassifierKind::Svm => Box::new(SupportVectorMachine::new(seed)),
            ClassifierKind::DecisionTree => Box::new(DecisionTree::new(seed)),
            ClassifierKind::RandomForest => Box::new(RandomForest::new(seed)),
            ClassifierKind::GradientBoosting => Box::new(GradientBoosting::new(seed)),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

impl FromStr for ClassifierKind {
    type Err = EvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClassifierKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.abbreviation() == s)
            .ok_or_else(|| EvaluationError::UnknownClassifier { id: s.to_string() })
    }
}

impl TryFrom<String> for ClassifierKind {
    type Error = EvaluationError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        id.parse()
    }
}

/// Check a training partition before fitting
pub(crate) fn check_training_input(
    x: ArrayView2<'_, f64>,
    y: &[usize],
    n_classes: usize,
) -> Result<(), EvaluationError> {
    if x.nrows() == 0 {
        return Err(EvaluationError::EmptyFeatureTable);
    }
    if x.nrows() != y.len() {
        return Err(EvaluationError::shape_mismatch(
            "training labels",
            x.nrows(),
            y.len(),
        ));
    }
    if let Some(&label) = y.iter().find(|&&label| label >= n_classes) {
        return Err(EvaluationError::shape_mismatch(
            "class id exceeds class count",
            n_classes,
            label + 1,
        ));
    }
    Ok(())
}

/// Check a prediction input against the fitted feature count
pub(crate) fn check_prediction_input(
    x: ArrayView2<'_, f64>,
    n_features: Option<usize>,
) -> Result<(), EvaluationError> {
    match n_features {
        None => Err(EvaluationError::shape_mismatch("classifier is not fitted", 1, 0)),
        Some(expected) if expected != x.ncols() => Err(EvaluationError::shape_mismatch(
            "prediction features",
            expected,
            x.ncols(),
        )),
        Some(_) => Ok(()),
    }
}

/// Relative class frequencies of a label set
pub(crate) fn class_distribution(y: &[usize], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &label in y {
        counts[label] += 1.0;
    }
    let total = y.len().max(1) as f64;
    counts.iter_mut().for_each(|c| *c /= total);
    counts
}

#[cfg(test)]
#[path = "classifier_tests.rs"]
mod tests;
