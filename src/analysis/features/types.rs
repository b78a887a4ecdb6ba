// Types module - Feature vector and statistic catalogue
//
// Statistics are listed in the order they appear in every feature vector.

use std::fmt;

use serde::Serialize;

/// Per-channel statistic computed by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Statistic {
    Mean,
    Variance,
    StdDev,
    Median,
    Max,
    Min,
    PeakToPeak,
    Percentile25,
    Percentile75,
    PsdSum,
    SpectralEntropy,
}

impl Statistic {
    /// All statistics in feature-vector order
    pub const ALL: [Statistic; 11] = [
        Statistic::Mean,
        Statistic::Variance,
        Statistic::StdDev,
        Statistic::Median,
        Statistic::Max,
        Statistic::Min,
        Statistic::PeakToPeak,
        Statistic::Percentile25,
        Statistic::Percentile75,
        Statistic::PsdSum,
        Statistic::SpectralEntropy,
    ];

    /// Prefix used in feature names, e.g. `centile25`
    pub fn name(self) -> &'static str {
        match self {
            Statistic::Mean => "mean",
            Statistic::Variance => "var",
            Statistic::StdDev => "std",
            Statistic::Median => "median",
            Statistic::Max => "max",
            Statistic::Min => "min",
            Statistic::PeakToPeak => "ptp",
            Statistic::Percentile25 => "centile25",
            Statistic::Percentile75 => "centile75",
            Statistic::PsdSum => "psd",
            Statistic::SpectralEntropy => "pse",
        }
    }

    pub fn is_spectral(self) -> bool {
        matches!(self, Statistic::PsdSum | Statistic::SpectralEntropy)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named feature values for one segment
///
/// Names follow `{statistic}_{channel}` with statistics outer-looped and
/// channels inner-looped. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub(crate) fn new(names: Vec<String>, values: Vec<f64>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self { names, values }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named feature
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
