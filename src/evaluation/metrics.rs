// MetricsEvaluator - per-fold scoring and cross-fold aggregation
//
// Probabilities are turned into hard predictions by arg-max (first column on
// ties). Accuracy, macro sensitivity, macro precision and macro F1 are taken
// over the sorted union of true and predicted labels; per-class ratios with
// a zero denominator count as 0. AUROC uses the positive-class column for
// two-class tables and the one-vs-one macro average (Hand & Till) otherwise.
// Specificity averages TN / (TN + FP) over the scored classes.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::classifier::ClassifierKind;
use super::FoldResult;
use crate::error::EvaluationError;

/// Divisor used when averaging per-class specificity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpecificityAveraging {
    /// Divide by the number of classes actually scored
    #[default]
    ClassesScored,
    /// Divide by 4 whatever the class count; matches the four-class
    /// baseline only when exactly four classes are scored
    FixedFour,
}

/// Scores of one classifier on one fold
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FoldScores {
    pub accuracy: f64,
    pub specificity: f64,
    pub sensitivity: f64,
    pub precision: f64,
    pub f1: f64,
    pub auroc: f64,
}

impl FoldScores {
    /// Metric names in report order
    pub const METRIC_NAMES: [&'static str; 6] = [
        "accuracy",
        "specificity",
        "sensitivity",
        "precision",
        "f1",
        "auroc",
    ];

    pub fn values(&self) -> [f64; 6] {
        [
            self.accuracy,
            self.specificity,
            self.sensitivity,
            self.precision,
            self.f1,
            self.auroc,
        ]
    }

    pub fn get(&self, metric: &str) -> Option<f64> {
        Self::METRIC_NAMES
            .iter()
            .position(|name| *name == metric)
            .map(|i| self.values()[i])
    }

    fn from_values(values: [f64; 6]) -> Self {
        let [accuracy, specificity, sensitivity, precision, f1, auroc] = values;
        Self {
            accuracy,
            specificity,
            sensitivity,
            precision,
            f1,
            auroc,
        }
    }
}

/// Flat, serialisable result of one (frequency, model, fold) unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub frequency_hz: u32,
    #[serde(rename = "abbreviation")]
    pub model: ClassifierKind,
    pub name: String,
    /// 1-based fold number
    pub fold: usize,
    #[serde(flatten)]
    pub scores: FoldScores,
    pub fit_time_s: f64,
    pub predict_time_s: f64,
    /// Rows are true classes, columns predicted classes
    pub confusion_matrix: Vec<Vec<usize>>,
}

impl ScoreRecord {
    /// Metric name → value
    pub fn metrics_map(&self) -> BTreeMap<&'static str, f64> {
        FoldScores::METRIC_NAMES
            .iter()
            .copied()
            .zip(self.scores.values())
            .collect()
    }
}

/// Mean and sample variance of every metric across the folds of one
/// (frequency, model) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub frequency_hz: u32,
    #[serde(rename = "abbreviation")]
    pub model: ClassifierKind,
    pub name: String,
    pub folds: usize,
    pub mean: FoldScores,
    pub variance: FoldScores,
}

/// Index of the largest value per row, first on ties
pub fn argmax_rows(proba: ArrayView2<'_, f64>) -> Vec<usize> {
    proba
        .outer_iter()
        .map(|row| {
            let mut best = 0;
            for (i, &p) in row.iter().enumerate() {
                if p > row[best] {
                    best = i;
                }
            }
            best
        })
        .collect()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Area under the ROC curve via the rank-sum statistic (ties share ranks)
///
/// # Errors
/// `UndefinedMetric` if only one class is present
pub fn binary_auroc(positive: &[bool], scores: &[f64]) -> Result<f64, EvaluationError> {
    let n_pos = positive.iter().filter(|&&p| p).count();
    let n_neg = positive.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Err(EvaluationError::UndefinedMetric {
            metric: "auroc",
            reason: "only one class present in the held-out labels".to_string(),
        });
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // Ranks start..end (1-based start+1..=end) share their average
        let average_rank = (start + 1 + end) as f64 / 2.0;
        rank_sum += average_rank * order[start..end].iter().filter(|&&i| positive[i]).count() as f64;
        start = end;
    }

    let n_pos = n_pos as f64;
    Ok((rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}

/// Macro one-vs-one AUROC over the classes present in `y_true`
fn ovo_auroc(y_true: &[usize], proba: ArrayView2<'_, f64>) -> Result<f64, EvaluationError> {
    let mut classes: Vec<usize> = y_true.to_vec();
    classes.sort_unstable();
    classes.dedup();
    if classes.len() < 2 {
        return Err(EvaluationError::UndefinedMetric {
            metric: "auroc",
            reason: "fewer than two classes present in the held-out labels".to_string(),
        });
    }

    let mut total = 0.0;
    let mut pairs = 0;
    for (i, &a) in classes.iter().enumerate() {
        for &b in &classes[i + 1..] {
            let rows: Vec<usize> = (0..y_true.len())
                .filter(|&r| y_true[r] == a || y_true[r] == b)
                .collect();
            let is_a: Vec<bool> = rows.iter().map(|&r| y_true[r] == a).collect();
            let is_b: Vec<bool> = is_a.iter().map(|&x| !x).collect();
            let score_a: Vec<f64> = rows.iter().map(|&r| proba[[r, a]]).collect();
            let score_b: Vec<f64> = rows.iter().map(|&r| proba[[r, b]]).collect();

            total += (binary_auroc(&is_a, &score_a)? + binary_auroc(&is_b, &score_b)?) / 2.0;
            pairs += 1;
        }
    }

    Ok(total / pairs as f64)
}

/// Counts with rows = true class, columns = predicted class
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], n_classes: usize) -> Array2<usize> {
    let size = y_true
        .iter()
        .chain(y_pred)
        .map(|&c| c + 1)
        .max()
        .unwrap_or(0)
        .max(n_classes);
    let mut matrix = Array2::zeros((size, size));
    for (&t, &p) in y_true.iter().zip(y_pred) {
        matrix[[t, p]] += 1;
    }
    matrix
}

/// Scores fold results
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEvaluator {
    averaging: SpecificityAveraging,
}

impl MetricsEvaluator {
    pub fn new(averaging: SpecificityAveraging) -> Self {
        Self { averaging }
    }

    /// Score held-out labels against a probability matrix
    ///
    /// # Errors
    /// * `ShapeMismatch` if rows of `proba` and `y_true` disagree
    /// * `EmptyFeatureTable` if there are no rows
    /// * `UndefinedMetric` if AUROC cannot be computed
    pub fn compute(
        &self,
        y_true: &[usize],
        proba: ArrayView2<'_, f64>,
    ) -> Result<(FoldScores, Array2<usize>), EvaluationError> {
        if proba.nrows() != y_true.len() {
            return Err(EvaluationError::shape_mismatch(
                "probability rows",
                y_true.len(),
                proba.nrows(),
            ));
        }
        if y_true.is_empty() {
            return Err(EvaluationError::EmptyFeatureTable);
        }

        let y_pred = argmax_rows(proba);
        let matrix = confusion_matrix(y_true, &y_pred, proba.ncols());
        let total = y_true.len();

        let mut labels: Vec<usize> = y_true.iter().chain(&y_pred).copied().collect();
        labels.sort_unstable();
        labels.dedup();

        let mut recall_sum = 0.0;
        let mut precision_sum = 0.0;
        let mut f1_sum = 0.0;
        let mut specificity_sum = 0.0;
        for &class in &labels {
            let tp = matrix[[class, class]];
            let actual = matrix.row(class).sum();
            let predicted = matrix.column(class).sum();
            let fn_ = actual - tp;
            let fp = predicted - tp;
            let tn = total - tp - fn_ - fp;

            recall_sum += ratio(tp, actual);
            precision_sum += ratio(tp, predicted);
            f1_sum += ratio(2 * tp, 2 * tp + fp + fn_);
            specificity_sum += ratio(tn, tn + fp);
        }

        let n_labels = labels.len() as f64;
        let specificity_divisor = match self.averaging {
            SpecificityAveraging::ClassesScored => n_labels,
            SpecificityAveraging::FixedFour => 4.0,
        };

        let correct = (0..matrix.nrows()).map(|c| matrix[[c, c]]).sum::<usize>();
        let auroc = if proba.ncols() == 2 {
            let positive: Vec<bool> = y_true.iter().map(|&y| y == 1).collect();
            binary_auroc(&positive, &proba.column(1).to_vec())?
        } else {
            ovo_auroc(y_true, proba)?
        };

        let scores = FoldScores {
            accuracy: ratio(correct, total),
            specificity: specificity_sum / specificity_divisor,
            sensitivity: recall_sum / n_labels,
            precision: precision_sum / n_labels,
            f1: f1_sum / n_labels,
            auroc,
        };
        Ok((scores, matrix))
    }

    /// Score one fold result into a report record
    pub fn score(&self, frequency_hz: u32, result: &FoldResult) -> Result<ScoreRecord, EvaluationError> {
        let (scores, matrix) = self.compute(&result.test_labels, result.probabilities.view())?;
        Ok(ScoreRecord {
            frequency_hz,
            model: result.kind,
            name: result.kind.display_name().to_string(),
            fold: result.fold_index + 1,
            scores,
            fit_time_s: result.fit_time.as_secs_f64(),
            predict_time_s: result.predict_time.as_secs_f64(),
            confusion_matrix: matrix.outer_iter().map(|row| row.to_vec()).collect(),
        })
    }

    /// Score every fold result of one frequency, preserving order
    pub fn score_all(
        &self,
        frequency_hz: u32,
        results: &[FoldResult],
    ) -> Result<Vec<ScoreRecord>, EvaluationError> {
        results.iter().map(|r| self.score(frequency_hz, r)).collect()
    }
}

/// Per (frequency, model) mean and sample variance, in first-seen order
pub fn summarize(records: &[ScoreRecord]) -> Vec<MetricSummary> {
    let mut groups: Vec<((u32, ClassifierKind), Vec<&ScoreRecord>)> = Vec::new();
    for record in records {
        let key = (record.frequency_hz, record.model);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }

    groups
        .into_iter()
        .map(|((frequency_hz, model), members)| {
            let n = members.len() as f64;
            let mut mean = [0.0; 6];
            for record in &members {
                for (m, v) in mean.iter_mut().zip(record.scores.values()) {
                    *m += v / n;
                }
            }
            let mut variance = [0.0; 6];
            if members.len() > 1 {
                for record in &members {
                    for ((var, v), m) in variance.iter_mut().zip(record.scores.values()).zip(mean) {
                        *var += (v - m).powi(2) / (n - 1.0);
                    }
                }
            }

            MetricSummary {
                frequency_hz,
                model,
                name: model.display_name().to_string(),
                folds: members.len(),
                mean: FoldScores::from_values(mean),
                variance: FoldScores::from_values(variance),
            }
        })
        .collect()
}

/// Frequency whose mean of `metric` across models is highest (first on ties)
pub fn best_frequency(summaries: &[MetricSummary], metric: &str) -> Option<u32> {
    let mut per_frequency: Vec<(u32, f64, usize)> = Vec::new();
    for summary in summaries {
        let value = summary.mean.get(metric)?;
        match per_frequency.iter_mut().find(|(f, _, _)| *f == summary.frequency_hz) {
            Some((_, sum, count)) => {
                *sum += value;
                *count += 1;
            }
            None => per_frequency.push((summary.frequency_hz, value, 1)),
        }
    }

    let mut best: Option<(u32, f64)> = None;
    for (frequency, sum, count) in per_frequency {
        let mean = sum / count as f64;
        if best.map_or(true, |(_, b)| mean > b) {
            best = Some((frequency, mean));
        }
    }
    best.map(|(frequency, _)| frequency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_perfect_binary_predictions() {
        let y = [0, 1, 1, 0];
        let proba = array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
        let (scores, matrix) = MetricsEvaluator::default().compute(&y, proba.view()).unwrap();
        assert_eq!(scores.accuracy, 1.0);
        assert_eq!(scores.auroc, 1.0);
        assert_eq!(scores.sensitivity, 1.0);
        assert_eq!(scores.precision, 1.0);
        assert_eq!(scores.f1, 1.0);
        assert_eq!(scores.specificity, 1.0);
        assert_eq!(matrix, array![[2usize, 0], [0, 2]]);
    }

    #[test]
    fn test_random_binary_probabilities_near_half() {
        let mut rng = StdRng::seed_from_u64(5);
        let n = 4000;
        let y: Vec<usize> = (0..n).map(|i| i % 2).collect();
        let mut proba = Array2::zeros((n, 2));
        for row in 0..n {
            let v: f64 = rng.gen();
            proba[[row, 0]] = 1.0 - v;
            proba[[row, 1]] = v;
        }
        let (scores, _) = MetricsEvaluator::default().compute(&y, proba.view()).unwrap();
        assert!((scores.auroc - 0.5).abs() < 0.05);
    }

    #[test]
    fn test_known_binary_scores() {
        // tp=2 fn=1 fp=1 tn=2 for class 1
        let y = [1, 1, 1, 0, 0, 0];
        let proba = array![
            [0.2, 0.8],
            [0.4, 0.6],
            [0.7, 0.3],
            [0.1, 0.9],
            [0.6, 0.4],
            [0.9, 0.1]
        ];
        let (scores, matrix) = MetricsEvaluator::default().compute(&y, proba.view()).unwrap();
        assert_eq!(matrix, array![[2usize, 1], [1, 2]]);
        assert_abs_diff_eq!(scores.accuracy, 4.0 / 6.0);
        assert_abs_diff_eq!(scores.sensitivity, 2.0 / 3.0);
        assert_abs_diff_eq!(scores.precision, 2.0 / 3.0);
        assert_abs_diff_eq!(scores.specificity, 2.0 / 3.0);
        // Positive scores 0.8, 0.6, 0.3 vs negative 0.9, 0.4, 0.1: 5 of 9 pairs
        assert_abs_diff_eq!(scores.auroc, 5.0 / 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_specificity_divisor_modes() {
        let y = [0, 1, 1, 0];
        let proba = array![[1.0, 0.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
        let (fixed, _) = MetricsEvaluator::new(SpecificityAveraging::FixedFour)
            .compute(&y, proba.view())
            .unwrap();
        assert_eq!(fixed.specificity, 0.5);
    }

    /// One-hot-ish probabilities whose arg-max is `predicted`
    fn proba_for(predicted: &[usize], n_classes: usize) -> Array2<f64> {
        let rest = 0.4 / (n_classes - 1) as f64;
        Array2::from_shape_fn((predicted.len(), n_classes), |(row, class)| {
            if class == predicted[row] {
                0.6
            } else {
                rest
            }
        })
    }

    #[test]
    fn test_three_class_specificity() {
        let y = [0, 0, 1, 1, 2, 2];
        let proba = proba_for(&[0, 1, 1, 1, 2, 0], 3);

        let (scored, matrix) = MetricsEvaluator::new(SpecificityAveraging::ClassesScored)
            .compute(&y, proba.view())
            .unwrap();
        assert_eq!(matrix, array![[1usize, 1, 0], [0, 2, 0], [1, 0, 1]]);
        // TN / (TN + FP): class 0 3/4, class 1 3/4, class 2 4/4
        assert_abs_diff_eq!(scored.specificity, 2.5 / 3.0, epsilon = 1e-12);

        let (fixed, _) = MetricsEvaluator::new(SpecificityAveraging::FixedFour)
            .compute(&y, proba.view())
            .unwrap();
        assert_abs_diff_eq!(fixed.specificity, 2.5 / 4.0, epsilon = 1e-12);
        assert_eq!(fixed.accuracy, scored.accuracy);
    }

    #[test]
    fn test_four_class_specificity_modes_agree() {
        let y = [0, 0, 1, 1, 2, 2, 3, 3];
        let proba = proba_for(&[0, 0, 1, 2, 2, 2, 3, 0], 4);

        let (scored, matrix) = MetricsEvaluator::new(SpecificityAveraging::ClassesScored)
            .compute(&y, proba.view())
            .unwrap();
        assert_eq!(
            matrix,
            array![[2usize, 0, 0, 0], [0, 1, 1, 0], [0, 0, 2, 0], [1, 0, 0, 1]]
        );
        // Per class: 5/6, 6/6, 5/6, 6/6
        assert_abs_diff_eq!(scored.specificity, 11.0 / 12.0, epsilon = 1e-12);

        let (fixed, _) = MetricsEvaluator::new(SpecificityAveraging::FixedFour)
            .compute(&y, proba.view())
            .unwrap();
        assert_abs_diff_eq!(fixed.specificity, scored.specificity, epsilon = 1e-12);
    }

    #[test]
    fn test_auroc_ties_share_rank() {
        let auroc = binary_auroc(&[true, false], &[0.5, 0.5]).unwrap();
        assert_eq!(auroc, 0.5);
        assert!(matches!(
            binary_auroc(&[true, true], &[0.1, 0.2]),
            Err(EvaluationError::UndefinedMetric { .. })
        ));
    }

    #[test]
    fn test_multi_class_perfect_and_zero_division() {
        let y = [0, 1, 2, 3];
        let proba = array![
            [0.7, 0.1, 0.1, 0.1],
            [0.1, 0.7, 0.1, 0.1],
            [0.1, 0.1, 0.7, 0.1],
            [0.1, 0.1, 0.7, 0.1]
        ];
        let (scores, matrix) = MetricsEvaluator::default().compute(&y, proba.view()).unwrap();
        assert_eq!(matrix[[3, 2]], 1);
        assert_abs_diff_eq!(scores.accuracy, 0.75);
        // Class 3 is never predicted: precision 0, recall 0
        assert_abs_diff_eq!(scores.sensitivity, 0.75);
        assert_abs_diff_eq!(scores.precision, (1.0 + 1.0 + 0.5) / 4.0);
        assert!(scores.auroc > 0.5 && scores.auroc <= 1.0);
        assert!(scores.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_shape_mismatch() {
        let proba = array![[1.0, 0.0]];
        assert!(matches!(
            MetricsEvaluator::default().compute(&[0, 1], proba.view()),
            Err(EvaluationError::ShapeMismatch { .. })
        ));
    }

    fn record(frequency_hz: u32, model: ClassifierKind, fold: usize, accuracy: f64) -> ScoreRecord {
        ScoreRecord {
            frequency_hz,
            model,
            name: model.display_name().to_string(),
            fold,
            scores: FoldScores {
                accuracy,
                ..FoldScores::default()
            },
            fit_time_s: 0.0,
            predict_time_s: 0.0,
            confusion_matrix: vec![],
        }
    }

    #[test]
    fn test_summarize_mean_and_sample_variance() {
        let records = vec![
            record(10, ClassifierKind::Knn, 1, 0.8),
            record(10, ClassifierKind::Knn, 2, 0.6),
            record(10, ClassifierKind::DecisionTree, 1, 0.9),
        ];
        let summaries = summarize(&records);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].model, ClassifierKind::Knn);
        assert_eq!(summaries[0].folds, 2);
        assert_abs_diff_eq!(summaries[0].mean.accuracy, 0.7, epsilon = 1e-12);
        assert_abs_diff_eq!(summaries[0].variance.accuracy, 0.02, epsilon = 1e-12);
        assert_eq!(summaries[1].variance.accuracy, 0.0);
    }

    #[test]
    fn test_best_frequency() {
        let records = vec![
            record(5, ClassifierKind::Knn, 1, 0.6),
            record(5, ClassifierKind::Svm, 1, 0.7),
            record(50, ClassifierKind::Knn, 1, 0.9),
            record(50, ClassifierKind::Svm, 1, 0.8),
        ];
        let summaries = summarize(&records);
        assert_eq!(best_frequency(&summaries, "accuracy"), Some(50));
        assert_eq!(best_frequency(&summaries, "nonsense"), None);
    }

    #[test]
    fn test_record_serialization_is_flat() {
        let r = record(20, ClassifierKind::RandomForest, 3, 0.5);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["abbreviation"], "rf");
        assert_eq!(json["accuracy"], 0.5);
        assert_eq!(json["fold"], 3);
        assert_eq!(r.metrics_map()["accuracy"], 0.5);
        assert_eq!(r.metrics_map().len(), 6);
    }
}
