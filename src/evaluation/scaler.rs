// Scaler - per-column min-max normalisation
//
// Two-phase contract: `fit` learns column ranges from one partition,
// `transform` applies them to any partition. Columns with zero range are
// only shifted by their minimum.

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::EvaluationError;

/// Where the scaler is fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalingMode {
    /// Fit on each fold's training partition
    #[default]
    PerFold,
    /// Fit once on the full table before splitting.
    /// Test rows influence the column ranges, so scores leak across folds.
    GlobalLeaky,
}

/// Min-max scaler mapping each training column onto [0, 1]
#[derive(Debug, Clone, Default)]
pub struct MinMaxScaler {
    min: Option<Array1<f64>>,
    scale: Option<Array1<f64>>,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.min.is_some()
    }

    /// Learn column minima and ranges
    ///
    /// # Errors
    /// `EmptyFeatureTable` if `x` has no rows
    pub fn fit(&mut self, x: ArrayView2<'_, f64>) -> Result<(), EvaluationError> {
        if x.nrows() == 0 {
            return Err(EvaluationError::EmptyFeatureTable);
        }

        let min = x.fold_axis(Axis(0), f64::INFINITY, |&acc, &v| acc.min(v));
        let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| acc.max(v));
        let scale = (&max - &min).mapv(|range| if range > 0.0 { 1.0 / range } else { 1.0 });

        self.min = Some(min);
        self.scale = Some(scale);
        Ok(())
    }

    /// Apply the learned ranges
    ///
    /// # Errors
    /// `ShapeMismatch` if unfitted or the column count differs from the fit
    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        let (min, scale) = match (&self.min, &self.scale) {
            (Some(min), Some(scale)) => (min, scale),
            _ => return Err(EvaluationError::shape_mismatch("scaler is not fitted", 1, 0)),
        };
        if x.ncols() != min.len() {
            return Err(EvaluationError::shape_mismatch(
                "scaler columns",
                min.len(),
                x.ncols(),
            ));
        }

        Ok((&x - min) * scale)
    }

    pub fn fit_transform(&mut self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        self.fit(x)?;
        self.transform(x)
    }
}
