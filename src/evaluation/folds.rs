// Folds - non-shuffled stratified k-fold splitting
//
// Classes are encoded in order of first appearance, the sorted label
// sequence is dealt round-robin over the k folds to fix how many examples
// of each class every fold receives, and then each class's examples are
// assigned to folds in input order. Fold membership is therefore fully
// determined by the label order.

use crate::error::EvaluationError;

/// One train/test partition of the row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Zero-based fold number
    pub index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold splitter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    k_fold: usize,
}

impl StratifiedKFold {
    /// # Errors
    /// `InvalidFoldCount` if `k_fold < 2`
    pub fn new(k_fold: usize) -> Result<Self, EvaluationError> {
        if k_fold < 2 {
            return Err(EvaluationError::InvalidFoldCount { k_fold });
        }
        Ok(Self { k_fold })
    }

    pub fn k_fold(&self) -> usize {
        self.k_fold
    }

    /// Partition row indices into `k` stratified folds
    ///
    /// # Arguments
    /// * `labels` - Class id per row
    ///
    /// # Returns
    /// `k` folds in order; each row is in exactly one test set
    ///
    /// # Errors
    /// * `EmptyFeatureTable` if there are no labels
    /// * `InsufficientSamples` if any class has fewer than `k` rows
    pub fn split(&self, labels: &[usize]) -> Result<Vec<Fold>, EvaluationError> {
        if labels.is_empty() {
            return Err(EvaluationError::EmptyFeatureTable);
        }

        // Encode classes by order of first appearance
        let mut first_seen: Vec<usize> = Vec::new();
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| match first_seen.iter().position(|l| l == label) {
                Some(code) => code,
                None => {
                    first_seen.push(*label);
                    first_seen.len() - 1
                }
            })
            .collect();
        let n_classes = first_seen.len();

        let mut counts = vec![0usize; n_classes];
        for &code in &encoded {
            counts[code] += 1;
        }
        if let Some((code, &count)) = counts.iter().enumerate().find(|(_, &c)| c < self.k_fold) {
            return Err(EvaluationError::InsufficientSamples {
                class: first_seen[code],
                count,
                k_fold: self.k_fold,
            });
        }

        // Deal the sorted codes round-robin: allocation[fold][class]
        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        let mut allocation = vec![vec![0usize; n_classes]; self.k_fold];
        for (position, &code) in sorted.iter().enumerate() {
            allocation[position % self.k_fold][code] += 1;
        }

        let mut test_fold = vec![0usize; labels.len()];
        for code in 0..n_classes {
            let mut targets = (0..self.k_fold)
                .flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][code]));
            for (row, _) in encoded.iter().enumerate().filter(|(_, &c)| c == code) {
                test_fold[row] = targets.next().unwrap_or(self.k_fold - 1);
            }
        }

        Ok((0..self.k_fold)
            .map(|index| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..labels.len()).partition(|&row| test_fold[row] == index);
                Fold { index, train, test }
            })
            .collect())
    }
}
