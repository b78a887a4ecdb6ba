//! Experiment configuration
//!
//! All parameters of a benchmark run live in one JSON document with three
//! sections: which sensor data to load, how to preprocess it and how to
//! evaluate the classifiers. Missing fields take their defaults, so a
//! partial file only needs to name what it changes.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::dataset::ClassificationMode;
use crate::evaluation::{ClassifierKind, ScalingMode, SpecificityAveraging};

/// Native SisFall sampling rate; every target frequency must divide it
pub const NATIVE_RATE_HZ: u32 = 200;

/// Subjects excluded by default (incomplete or elderly-only sessions)
pub const DEFAULT_IGNORED_SUBJECTS: [&str; 18] = [
    "SA17", "SA20", "SA23", "SE01", "SE02", "SE03", "SE04", "SE05", "SE06", "SE07", "SE08",
    "SE09", "SE10", "SE11", "SE12", "SE13", "SE14", "SE15",
];

/// Complete experiment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExperimentConfig {
    pub acquisition: AcquisitionConfig,
    pub preprocessing: PreprocessingConfig,
    pub evaluation: EvaluationConfig,
}

/// Which recordings and sensor axes to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Raw column indices (0..=8): acc x/y/z, gyro x/y/z, acc_2 x/y/z
    pub sensor_axes: Vec<usize>,
    /// Subject folders to skip
    pub ignored_subjects: Vec<String>,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sensor_axes: (0..6).collect(),
            ignored_subjects: DEFAULT_IGNORED_SUBJECTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Trimming, resampling and segmentation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessingConfig {
    /// Duration every recording is trimmed to
    pub duration_ms: u32,
    /// Target sampling frequencies, one feature table each
    pub frequencies_hz: Vec<u32>,
    /// Pre-event window, converted to a length fraction as ms / 1000
    pub pre_time_ms: u32,
    /// Post-event window, converted to a length fraction as ms / 1000
    pub post_time_ms: u32,
    pub classification: ClassificationMode,
    /// Append a Euclidean-norm channel per triple of selected axes
    pub with_magnitude: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            duration_ms: 10_000,
            frequencies_hz: vec![1, 2, 5, 10, 20, 50, 100, 200],
            pre_time_ms: 1500,
            post_time_ms: 500,
            classification: ClassificationMode::Binary,
            with_magnitude: true,
        }
    }
}

/// Cross-validation and scoring parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub models: Vec<ClassifierKind>,
    pub k_fold: usize,
    pub scaling: ScalingMode,
    pub specificity_averaging: SpecificityAveraging,
    /// Base seed for every randomised classifier
    pub seed: u64,
    /// Run fold × model units on the rayon pool
    pub parallel: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            models: ClassifierKind::ALL.to_vec(),
            k_fold: 5,
            scaling: ScalingMode::default(),
            specificity_averaging: SpecificityAveraging::default(),
            seed: 42,
            parallel: true,
        }
    }
}

impl ExperimentConfig {
    /// Load configuration from JSON file, failing on any read/parse error
    pub fn from_file_strict<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        log::info!("[Config] Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Check every parameter against its allowed range
    ///
    /// # Returns
    /// One message per violated rule; empty when the configuration is valid
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let acq = &self.acquisition;
        let pre = &self.preprocessing;
        let eval = &self.evaluation;

        if acq.sensor_axes.is_empty() {
            problems.push("sensor_axes must not be empty".to_string());
        }
        if has_duplicates(&acq.sensor_axes) {
            problems.push("sensor_axes must be unique".to_string());
        }
        let axis_count = acq.sensor_axes.len();
        if axis_count > 0 && ![3, 6, 9].contains(&axis_count) {
            problems.push(format!(
                "sensor_axes selects {} axes; expected 3, 6 or 9",
                axis_count
            ));
        }
        if let Some(bad) = acq.sensor_axes.iter().find(|&&i| i > 8) {
            problems.push(format!("sensor axis {} is outside 0..=8", bad));
        }

        for subject in &acq.ignored_subjects {
            if !is_known_subject(subject) {
                problems.push(format!(
                    "ignored subject '{}' is not one of SA01-SA23 or SE01-SE15",
                    subject
                ));
            }
        }

        if !(1000..=12_000).contains(&pre.duration_ms) {
            problems.push(format!(
                "duration_ms {} is outside [1000, 12000]",
                pre.duration_ms
            ));
        }

        if pre.frequencies_hz.is_empty() {
            problems.push("frequencies_hz must not be empty".to_string());
        }
        if has_duplicates(&pre.frequencies_hz) {
            problems.push("frequencies_hz must be unique".to_string());
        }
        for &f in &pre.frequencies_hz {
            if f == 0 || NATIVE_RATE_HZ % f != 0 {
                problems.push(format!(
                    "frequency {} Hz does not divide the native {} Hz",
                    f, NATIVE_RATE_HZ
                ));
            }
        }

        let max_window = pre.duration_ms / 3;
        for (name, value) in [("pre_time_ms", pre.pre_time_ms), ("post_time_ms", pre.post_time_ms)] {
            if value < 1 || value > max_window {
                problems.push(format!(
                    "{} {} is outside [1, {}]",
                    name, value, max_window
                ));
            }
        }

        if eval.models.is_empty() {
            problems.push("models must not be empty".to_string());
        }
        if has_duplicates(&eval.models) {
            problems.push("models must be unique".to_string());
        }

        if !(2..=20).contains(&eval.k_fold) {
            problems.push(format!("k_fold {} is outside [2, 20]", eval.k_fold));
        }

        problems
    }
}

fn has_duplicates<T: Eq + std::hash::Hash>(values: &[T]) -> bool {
    let mut seen = HashSet::new();
    values.iter().any(|v| !seen.insert(v))
}

/// SA01-SA23 (young adults) or SE01-SE15 (elderly)
fn is_known_subject(subject: &str) -> bool {
    let (Some(prefix), Some(number)) = (subject.get(..2), subject.get(2..)) else {
        return false;
    };
    let max = match prefix {
        "SA" => 23,
        "SE" => 15,
        _ => return false,
    };
    number.len() == 2
        && number
            .parse::<u32>()
            .map(|n| (1..=max).contains(&n))
            .unwrap_or(false)
}
