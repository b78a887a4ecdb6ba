// Gradient Boosting - log-loss boosting of depth-3 regression trees
//
// Binary problems boost one raw score per row (probability = sigmoid),
// starting from the training log-odds. Multi-class problems boost one score
// per class (probability = softmax), starting from the log class priors.
// Each stage fits a regression tree to the negative gradient and replaces
// the leaf means with a single Newton step computed from the rows in that
// leaf.

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::tree::{MaxFeatures, Target, Tree, TreeParams};
use super::{check_prediction_input, check_training_input, class_distribution, Classifier};
use crate::error::EvaluationError;

const DEFAULT_STAGES: usize = 100;
const DEFAULT_LEARNING_RATE: f64 = 0.1;
const DEFAULT_MAX_DEPTH: usize = 3;

/// Probabilities are clipped away from 0 and 1 before taking logs
const PROBABILITY_CLIP: f64 = 1e-15;
/// Newton denominators below this yield a zero step
const DENOMINATOR_EPSILON: f64 = 1e-150;

pub struct GradientBoosting {
    n_stages: usize,
    learning_rate: f64,
    seed: u64,
    /// Initial raw score per boosted output
    init: Vec<f64>,
    /// `stages[s][k]` is the tree for output `k` at stage `s`
    stages: Vec<Vec<Tree>>,
    n_features: usize,
    n_classes: usize,
}

impl GradientBoosting {
    pub fn new(seed: u64) -> Self {
        Self::with_stages(DEFAULT_STAGES, DEFAULT_LEARNING_RATE, seed)
    }

    pub fn with_stages(n_stages: usize, learning_rate: f64, seed: u64) -> Self {
        Self {
            n_stages,
            learning_rate,
            seed,
            init: Vec::new(),
            stages: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of boosted raw scores: one for binary, one per class otherwise
    fn n_outputs(&self) -> usize {
        if self.n_classes <= 2 {
            1
        } else {
            self.n_classes
        }
    }

    fn tree_params() -> TreeParams {
        TreeParams {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            min_samples_split: 2,
            max_features: MaxFeatures::All,
        }
    }

    /// Raw scores (rows × outputs) for a feature matrix
    fn raw_scores(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let outputs = self.n_outputs();
        let mut raw = Array2::from_shape_fn((x.nrows(), outputs), |(_, k)| self.init[k]);
        for stage in &self.stages {
            for (k, tree) in stage.iter().enumerate() {
                for (row, sample) in x.outer_iter().enumerate() {
                    raw[[row, k]] += self.learning_rate * tree.predict_value(sample)[0];
                }
            }
        }
        raw
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Row-wise softmax of raw scores
fn softmax(raw: &[f64]) -> Vec<f64> {
    let max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = raw.iter().map(|r| (r - max).exp()).collect();
    let total: f64 = exp.iter().sum();
    exp.iter().map(|e| e / total).collect()
}

/// Fit one stage tree on `residuals` and set Newton leaf values
///
/// `hessian(row)` gives the per-row second-order weight, `scale` the
/// multiplicative factor of the step. Returns the tree and the leaf value
/// reached by each training row.
fn fit_stage_tree(
    x: ArrayView2<'_, f64>,
    residuals: &[f64],
    hessian: impl Fn(usize) -> f64,
    scale: f64,
    rng: &mut StdRng,
) -> (Tree, Vec<f64>) {
    let rows: Vec<usize> = (0..x.nrows()).collect();
    let mut tree = Tree::grow(
        x,
        Target::Values(residuals),
        rows,
        GradientBoosting::tree_params(),
        rng,
    );

    let leaves: Vec<usize> = x.outer_iter().map(|sample| tree.apply(sample)).collect();
    let mut numerator = vec![0.0; tree.node_count()];
    let mut denominator = vec![0.0; tree.node_count()];
    for (row, &leaf) in leaves.iter().enumerate() {
        numerator[leaf] += residuals[row];
        denominator[leaf] += hessian(row);
    }

    let values: Vec<f64> = numerator
        .iter()
        .zip(&denominator)
        .map(|(num, den)| {
            if den.abs() < DENOMINATOR_EPSILON {
                0.0
            } else {
                scale * num / den
            }
        })
        .collect();
    for &leaf in &leaves {
        tree.set_leaf_value(leaf, vec![values[leaf]]);
    }

    let steps = leaves.iter().map(|&leaf| values[leaf]).collect();
    (tree, steps)
}

impl Classifier for GradientBoosting {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), EvaluationError> {
        check_training_input(x, y, n_classes)?;
        self.n_classes = n_classes;
        self.n_features = x.ncols();
        self.stages.clear();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let n = x.nrows();
        let prior = class_distribution(y, n_classes);

        if n_classes <= 2 {
            let p = prior
                .get(1)
                .copied()
                .unwrap_or(0.0)
                .clamp(PROBABILITY_CLIP, 1.0 - PROBABILITY_CLIP);
            self.init = vec![(p / (1.0 - p)).ln()];
            let targets: Vec<f64> = y.iter().map(|&label| (label == 1) as u8 as f64).collect();
            let mut raw = vec![self.init[0]; n];

            for _ in 0..self.n_stages {
                let proba: Vec<f64> = raw.iter().map(|&r| sigmoid(r)).collect();
                let residuals: Vec<f64> = targets.iter().zip(&proba).map(|(t, p)| t - p).collect();
                let mut stage_rng = StdRng::seed_from_u64(rng.gen());
                let (tree, steps) = fit_stage_tree(
                    x,
                    &residuals,
                    |row| proba[row] * (1.0 - proba[row]),
                    1.0,
                    &mut stage_rng,
                );
                for (r, step) in raw.iter_mut().zip(&steps) {
                    *r += self.learning_rate * step;
                }
                self.stages.push(vec![tree]);
            }
        } else {
            self.init = prior
                .iter()
                .map(|p| p.clamp(PROBABILITY_CLIP, 1.0).ln())
                .collect();
            let k_factor = (n_classes - 1) as f64 / n_classes as f64;
            let mut raw = Array2::from_shape_fn((n, n_classes), |(_, k)| self.init[k]);

            for _ in 0..self.n_stages {
                let proba: Vec<Vec<f64>> = raw
                    .outer_iter()
                    .map(|row| softmax(&row.to_vec()))
                    .collect();
                let mut stage = Vec::with_capacity(n_classes);
                let mut updates = Array2::zeros((n, n_classes));

                for k in 0..n_classes {
                    let residuals: Vec<f64> = (0..n)
                        .map(|row| (y[row] == k) as u8 as f64 - proba[row][k])
                        .collect();
                    let mut stage_rng = StdRng::seed_from_u64(rng.gen());
                    let (tree, steps) = fit_stage_tree(
                        x,
                        &residuals,
                        |row| {
                            let r = residuals[row].abs();
                            r * (1.0 - r)
                        },
                        k_factor,
                        &mut stage_rng,
                    );
                    for (row, step) in steps.iter().enumerate() {
                        updates[[row, k]] = self.learning_rate * step;
                    }
                    stage.push(tree);
                }

                raw += &updates;
                self.stages.push(stage);
            }
        }

        tracing::debug!(
            "[GradientBoosting] Fitted {} stages x {} outputs on {} rows",
            self.stages.len(),
            self.n_outputs(),
            n
        );
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        let fitted = (!self.init.is_empty()).then_some(self.n_features);
        check_prediction_input(x, fitted)?;

        let raw = self.raw_scores(x);
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));

        match self.n_classes {
            1 => proba.fill(1.0),
            2 => {
                for row in 0..x.nrows() {
                    let p = sigmoid(raw[[row, 0]]);
                    proba[[row, 0]] = 1.0 - p;
                    proba[[row, 1]] = p;
                }
            }
            _ => {
                for (row, scores) in raw.outer_iter().enumerate() {
                    for (k, p) in softmax(&scores.to_vec()).into_iter().enumerate() {
                        proba[[row, k]] = p;
                    }
                }
            }
        }

        Ok(proba)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
