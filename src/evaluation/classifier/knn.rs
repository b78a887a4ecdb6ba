// k-Nearest Neighbour - Euclidean distance, uniform vote fractions

use ndarray::{Array2, ArrayView1, ArrayView2};

use super::{check_prediction_input, check_training_input, Classifier};
use crate::error::EvaluationError;

/// Default neighbour count
const DEFAULT_K: usize = 5;

/// Lazy classifier storing the training partition
pub struct KNearestNeighbors {
    k: usize,
    train_x: Option<Array2<f64>>,
    train_y: Vec<usize>,
    n_classes: usize,
}

impl KNearestNeighbors {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            train_x: None,
            train_y: Vec::new(),
            n_classes: 0,
        }
    }
}

impl Default for KNearestNeighbors {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Classifier for KNearestNeighbors {
    fn fit(
        &mut self,
        x: ArrayView2<'_, f64>,
        y: &[usize],
        n_classes: usize,
    ) -> Result<(), EvaluationError> {
        check_training_input(x, y, n_classes)?;
        self.train_x = Some(x.to_owned());
        self.train_y = y.to_vec();
        self.n_classes = n_classes;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, EvaluationError> {
        check_prediction_input(x, self.train_x.as_ref().map(|t| t.ncols()))?;
        let Some(train_x) = &self.train_x else {
            return Ok(Array2::zeros((0, 0)));
        };

        let k = self.k.min(train_x.nrows());
        let mut proba = Array2::zeros((x.nrows(), self.n_classes));
        let mut distances: Vec<(f64, usize)> = Vec::with_capacity(train_x.nrows());

        for (row, sample) in x.outer_iter().enumerate() {
            distances.clear();
            distances.extend(
                train_x
                    .outer_iter()
                    .enumerate()
                    .map(|(i, train)| (squared_distance(sample, train), i)),
            );
            // Stable ordering: equal distances keep training order
            distances.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

            for &(_, i) in &distances[..k] {
                proba[[row, self.train_y[i]]] += 1.0 / k as f64;
            }
        }

        Ok(proba)
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }
}
