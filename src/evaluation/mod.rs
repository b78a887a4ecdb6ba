// CrossValidationEngine - stratified k-fold evaluation of the classifier catalog
//
// Work is organised in (model, fold) units. Every unit builds a fresh
// classifier from the catalog, fits it on the fold's training rows and
// predicts class probabilities for the held-out rows. Units share only
// read-only inputs, so they may run on the rayon pool; results always come
// back in model-major, fold-minor order.

pub mod classifier;
pub mod folds;
pub mod metrics;
pub mod scaler;

pub use classifier::{Classifier, ClassifierKind};
pub use folds::{Fold, StratifiedKFold};
pub use metrics::{
    best_frequency, summarize, FoldScores, MetricSummary, MetricsEvaluator, ScoreRecord,
    SpecificityAveraging,
};
pub use scaler::{MinMaxScaler, ScalingMode};

use std::fmt;
use std::time::{Duration, Instant};

use ndarray::{Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::EvaluationConfig;
use crate::dataset::FeatureTable;
use crate::error::EvaluationError;

/// Outcome of one classifier instance on one fold
pub struct FoldResult {
    /// Zero-based fold number
    pub fold_index: usize,
    pub kind: ClassifierKind,
    /// The fitted classifier
    pub model: Box<dyn Classifier>,
    /// Held-out rows as fed to the classifier (after scaling)
    pub test_features: Array2<f64>,
    pub test_labels: Vec<usize>,
    /// Rows = held-out examples, columns = class ids
    pub probabilities: Array2<f64>,
    pub fit_time: Duration,
    pub predict_time: Duration,
}

impl fmt::Debug for FoldResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldResult")
            .field("fold_index", &self.fold_index)
            .field("kind", &self.kind)
            .field("test_rows", &self.test_labels.len())
            .field("fit_time", &self.fit_time)
            .field("predict_time", &self.predict_time)
            .finish()
    }
}

/// Seed for the classifier of one (model, fold) unit
fn unit_seed(seed: u64, kind: ClassifierKind, fold_index: usize) -> u64 {
    let mixed = seed ^ ((kind as u64 + 1) << 32) ^ fold_index as u64;
    StdRng::seed_from_u64(mixed).gen()
}

/// Stratified k-fold evaluation of a set of classifier families
#[derive(Debug, Clone)]
pub struct CrossValidationEngine {
    models: Vec<ClassifierKind>,
    k_fold: usize,
    scaling: ScalingMode,
    seed: u64,
    parallel: bool,
}

impl CrossValidationEngine {
    /// # Arguments
    /// * `models` - Families to evaluate, in report order
    /// * `k_fold` - Number of stratified folds
    pub fn new(models: Vec<ClassifierKind>, k_fold: usize) -> Self {
        Self {
            models,
            k_fold,
            scaling: ScalingMode::default(),
            seed: 0,
            parallel: false,
        }
    }

    pub fn from_config(config: &EvaluationConfig) -> Self {
        Self::new(config.models.clone(), config.k_fold)
            .with_scaling(config.scaling)
            .with_seed(config.seed)
            .with_parallel(config.parallel)
    }

    pub fn with_scaling(mut self, scaling: ScalingMode) -> Self {
        self.scaling = scaling;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn models(&self) -> &[ClassifierKind] {
        &self.models
    }

    /// Evaluate every configured family on every fold of a feature table
    ///
    /// # Returns
    /// One `FoldResult` per (model, fold), model-major
    ///
    /// # Errors
    /// * `InvalidFoldCount` if `k_fold < 2`
    /// * `EmptyFeatureTable` if the table has no rows
    /// * `InsufficientSamples` if a class has fewer than `k_fold` rows
    /// * Any error raised by a classifier
    pub fn run(&self, table: &FeatureTable) -> Result<Vec<FoldResult>, EvaluationError> {
        let splitter = StratifiedKFold::new(self.k_fold)?;
        if table.is_empty() {
            return Err(EvaluationError::EmptyFeatureTable);
        }
        let folds = splitter.split(&table.labels)?;

        let features = match self.scaling {
            ScalingMode::PerFold => table.features.clone(),
            ScalingMode::GlobalLeaky => {
                tracing::debug!("[CrossValidationEngine] Scaling full table before splitting");
                MinMaxScaler::new().fit_transform(table.features.view())?
            }
        };

        tracing::info!(
            "[CrossValidationEngine] {} Hz: {} rows, {} features, {} models x {} folds",
            table.frequency_hz,
            table.len(),
            table.feature_names.len(),
            self.models.len(),
            folds.len()
        );

        let units: Vec<(ClassifierKind, &Fold)> = self
            .models
            .iter()
            .flat_map(|&kind| folds.iter().map(move |fold| (kind, fold)))
            .collect();

        let run_unit = |&(kind, fold): &(ClassifierKind, &Fold)| {
            self.run_unit(kind, fold, features.view(), &table.labels, table.n_classes)
        };

        if self.parallel {
            units.par_iter().map(run_unit).collect()
        } else {
            units.iter().map(run_unit).collect()
        }
    }

    fn run_unit(
        &self,
        kind: ClassifierKind,
        fold: &Fold,
        features: ArrayView2<'_, f64>,
        labels: &[usize],
        n_classes: usize,
    ) -> Result<FoldResult, EvaluationError> {
        let mut train = features.select(Axis(0), &fold.train);
        let mut test = features.select(Axis(0), &fold.test);
        if self.scaling == ScalingMode::PerFold {
            let mut scaler = MinMaxScaler::new();
            train = scaler.fit_transform(train.view())?;
            test = scaler.transform(test.view())?;
        }

        let train_labels: Vec<usize> = fold.train.iter().map(|&row| labels[row]).collect();
        let test_labels: Vec<usize> = fold.test.iter().map(|&row| labels[row]).collect();

        let mut model = kind.build(unit_seed(self.seed, kind, fold.index));

        let start = Instant::now();
        model.fit(train.view(), &train_labels, n_classes)?;
        let fit_time = start.elapsed();

        let start = Instant::now();
        let probabilities = model.predict_proba(test.view())?;
        let predict_time = start.elapsed();

        tracing::debug!(
            "[CrossValidationEngine] {} fold {}: fit {:.3}s, predict {:.3}s",
            kind,
            fold.index + 1,
            fit_time.as_secs_f64(),
            predict_time.as_secs_f64()
        );

        Ok(FoldResult {
            fold_index: fold.index,
            kind,
            model,
            test_features: test,
            test_labels,
            probabilities,
            fit_time,
            predict_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn table(n_classes: usize, per_class: usize) -> FeatureTable {
        let n = n_classes * per_class;
        let features = Array2::from_shape_fn((n, 3), |(i, j)| {
            let class = i % n_classes;
            class as f64 * 10.0 + ((i * 7 + j * 11) % 5) as f64
        });
        FeatureTable {
            frequency_hz: 50,
            feature_names: vec!["a".into(), "b".into(), "c".into()],
            features,
            labels: (0..n).map(|i| i % n_classes).collect(),
            n_classes,
        }
    }

    #[test]
    fn test_results_are_model_major() {
        let engine = CrossValidationEngine::new(
            vec![ClassifierKind::DecisionTree, ClassifierKind::Knn],
            3,
        );
        let results = engine.run(&table(2, 6)).unwrap();
        assert_eq!(results.len(), 6);
        let order: Vec<(ClassifierKind, usize)> =
            results.iter().map(|r| (r.kind, r.fold_index)).collect();
        assert_eq!(
            order,
            vec![
                (ClassifierKind::DecisionTree, 0),
                (ClassifierKind::DecisionTree, 1),
                (ClassifierKind::DecisionTree, 2),
                (ClassifierKind::Knn, 0),
                (ClassifierKind::Knn, 1),
                (ClassifierKind::Knn, 2),
            ]
        );
        for result in &results {
            assert_eq!(result.probabilities.nrows(), result.test_labels.len());
            assert_eq!(result.probabilities.ncols(), 2);
            assert_eq!(result.test_features.nrows(), result.test_labels.len());
            assert_eq!(result.model.n_classes(), 2);
        }
    }

    #[test]
    fn test_test_rows_cover_table_once_per_model() {
        let t = table(3, 5);
        let results = CrossValidationEngine::new(vec![ClassifierKind::Knn], 5)
            .run(&t)
            .unwrap();
        let total: usize = results.iter().map(|r| r.test_labels.len()).sum();
        assert_eq!(total, t.len());
    }

    #[test]
    fn test_per_fold_scaling_uses_training_range() {
        let results = CrossValidationEngine::new(vec![ClassifierKind::Knn], 2)
            .run(&table(2, 4))
            .unwrap();
        // Held-out rows are scaled with the training range, so they stay
        // close to [0, 1] but need not hit both ends
        for result in &results {
            assert!(result.test_features.iter().all(|v| v.is_finite()));
        }

        let leaky = CrossValidationEngine::new(vec![ClassifierKind::Knn], 2)
            .with_scaling(ScalingMode::GlobalLeaky)
            .run(&table(2, 4))
            .unwrap();
        let max = leaky
            .iter()
            .flat_map(|r| r.test_features.iter().copied())
            .fold(f64::NEG_INFINITY, f64::max);
        assert_abs_diff_eq!(max, 1.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let t = table(2, 10);
        let models = vec![ClassifierKind::RandomForest, ClassifierKind::GradientBoosting];
        let sequential = CrossValidationEngine::new(models.clone(), 3)
            .with_seed(9)
            .run(&t)
            .unwrap();
        let parallel = CrossValidationEngine::new(models, 3)
            .with_seed(9)
            .with_parallel(true)
            .run(&t)
            .unwrap();
        for (a, b) in sequential.iter().zip(&parallel) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.fold_index, b.fold_index);
            assert_eq!(a.probabilities, b.probabilities);
        }
    }

    #[test]
    fn test_insufficient_samples() {
        let mut t = table(2, 6);
        t.labels[1] = 0;
        t.labels[3] = 0;
        t.labels[5] = 0;
        t.labels[7] = 0;
        // Class 1 now has 2 rows
        let err = CrossValidationEngine::new(vec![ClassifierKind::Knn], 3)
            .run(&t)
            .unwrap_err();
        assert!(matches!(
            err,
            EvaluationError::InsufficientSamples { class: 1, count: 2, k_fold: 3 }
        ));
    }

    #[test]
    fn test_invalid_fold_count() {
        let err = CrossValidationEngine::new(vec![ClassifierKind::Knn], 1)
            .run(&table(2, 4))
            .unwrap_err();
        assert_eq!(err, EvaluationError::InvalidFoldCount { k_fold: 1 });
    }
}
