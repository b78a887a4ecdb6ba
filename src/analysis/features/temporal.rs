// Temporal module - Time-domain statistics
//
// Variance is the population variance (divide by N). Percentiles use linear
// interpolation between closest ranks: position p/100 × (N - 1).

/// Time-domain statistics of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalFeatures {
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub median: f64,
    pub max: f64,
    pub min: f64,
    pub peak_to_peak: f64,
    pub percentile_25: f64,
    pub percentile_75: f64,
}

impl TemporalFeatures {
    /// Compute all time-domain statistics
    ///
    /// # Returns
    /// `None` for an empty channel
    pub fn compute(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = compute_mean(samples);
        let variance = compute_variance(samples, mean);
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];

        Some(Self {
            mean,
            variance,
            std_dev: variance.sqrt(),
            median: percentile_sorted(&sorted, 50.0),
            max,
            min,
            peak_to_peak: max - min,
            percentile_25: percentile_sorted(&sorted, 25.0),
            percentile_75: percentile_sorted(&sorted, 75.0),
        })
    }
}

pub fn compute_mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Population variance around a precomputed mean
pub fn compute_variance(samples: &[f64], mean: f64) -> f64 {
    samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64
}

/// Percentile of already-sorted data with linear interpolation
///
/// # Arguments
/// * `sorted` - Non-empty ascending samples
/// * `p` - Percentile in [0, 100]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}
