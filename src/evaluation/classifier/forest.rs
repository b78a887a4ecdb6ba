// Random Forest - bagged CART trees with √features per split

use ndarray::{Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::tree::{DecisionTree, MaxFeatures, TreeParams};
use super::{check_prediction_input, check_training_input, Classifier};
use crate::error::EvaluationError;

const DEFAULT_TREES: usize = 100;

pub struct RandomForest {
    n_trees: usize,
    seed: u64,
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(seed: u64) -> Self {
        Self::with_trees(DEFAULT_TREES, seed)
    }

    pub fn with_trees(n_trees: usize, seed: u64) -> Self {
        Self {
            n_trees: n_trees.max(1),
            seed,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), EvaluationError> {
        check_training_input(x, y, n_classes)?;

        // Draw every tree's seed up front so the ensemble is independent of
        // thread scheduling
        let mut rng = StdRng::seed_from_u64(self.seed);
        let seeds: Vec<u64> = (0..self.n_trees).map(|_| rng.gen()).collect();
        let n = x.nrows();
        let params = TreeParams {
            max_features: MaxFeatures::Sqrt,
            ..TreeParams::default()
        };

        self.trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut bootstrap_rng = StdRng::seed_from_u64(seed);
                let rows: Vec<usize> = (0..n).map(|_| bootstrap_rng.gen_range(0..n)).collect();
                let mut tree = DecisionTree::with_params(params, bootstrap_rng.gen());
                tree.fit_rows(x, y, n_classes, rows);
                tree
            })
            .collect();

        self.n_features = x.ncols();
        self.n_classes = n_classes;
        tracing::debug!("[RandomForest] Fitted {} trees on {} rows", self.trees.len(), n);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        let fitted = (!self.trees.is_empty()).then_some(self.n_features);
        check_prediction_input(x, fitted)?;

        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        for tree in &self.trees {
            proba += &tree.predict_proba(x)?;
        }
        proba /= self.trees.len() as f64;
        Ok(proba)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
