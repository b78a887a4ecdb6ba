//! Labelled feature tables, one per target sampling frequency.
//!
//! Every recording is trimmed to the configured duration, re-gridded to the
//! target frequency and described by the feature extractor. In multi-class
//! mode falls are additionally split into event, pre-event and post-event
//! phases, each contributing its own row. Row order follows the input
//! recording order.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::analysis::features::{FeatureExtractor, FeatureVector};
use crate::config::ExperimentConfig;
use crate::error::{log_preprocessing_error, DatasetError, PreprocessingError};
use crate::preprocessing::{resample_to_frequency, trim_to_duration, Segmentation, Segmenter};
use crate::signal::Recording;

/// Label scheme of the feature table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationMode {
    /// ADL vs. Fall
    #[default]
    Binary,
    /// ADL, Fall, Pre-fall and Post-fall
    MultiClass,
}

impl ClassificationMode {
    pub fn n_classes(self) -> usize {
        match self {
            ClassificationMode::Binary => 2,
            ClassificationMode::MultiClass => 4,
        }
    }

    /// Display names indexed by class id
    pub fn class_names(self) -> Vec<&'static str> {
        ActivityClass::ALL[..self.n_classes()]
            .iter()
            .map(|c| c.name())
            .collect()
    }
}

impl fmt::Display for ClassificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationMode::Binary => f.write_str("binary"),
            ClassificationMode::MultiClass => f.write_str("multi-class"),
        }
    }
}

/// Class label of one table row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityClass {
    Adl = 0,
    Fall = 1,
    PreFall = 2,
    PostFall = 3,
}

impl ActivityClass {
    pub const ALL: [ActivityClass; 4] = [
        ActivityClass::Adl,
        ActivityClass::Fall,
        ActivityClass::PreFall,
        ActivityClass::PostFall,
    ];

    pub fn id(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ActivityClass::Adl => "ADL",
            ActivityClass::Fall => "Fall",
            ActivityClass::PreFall => "Pre-fall",
            ActivityClass::PostFall => "Post-fall",
        }
    }
}

/// Feature matrix plus labels for one sampling frequency
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub frequency_hz: u32,
    pub feature_names: Vec<String>,
    /// Rows are examples, columns follow `feature_names`
    pub features: Array2<f64>,
    /// Class id per row
    pub labels: Vec<usize>,
    pub n_classes: usize,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of rows per class id
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &label in &self.labels {
            if label < counts.len() {
                counts[label] += 1;
            }
        }
        counts
    }
}

/// Assembles feature tables from recordings
pub struct DatasetBuilder {
    duration_ms: f64,
    mode: ClassificationMode,
    segmenter: Segmenter,
    extractor: FeatureExtractor,
}

impl DatasetBuilder {
    pub fn new(
        duration_ms: f64,
        mode: ClassificationMode,
        segmenter: Segmenter,
        extractor: FeatureExtractor,
    ) -> Self {
        Self {
            duration_ms,
            mode,
            segmenter,
            extractor,
        }
    }

    pub fn from_config(config: &ExperimentConfig) -> Self {
        let pre = &config.preprocessing;
        Self::new(
            pre.duration_ms as f64,
            pre.classification,
            Segmenter::from_event_times_ms(pre.pre_time_ms as f64, pre.post_time_ms as f64),
            FeatureExtractor::new(pre.with_magnitude),
        )
    }

    pub fn mode(&self) -> ClassificationMode {
        self.mode
    }

    /// Build the feature table for one target frequency
    ///
    /// # Errors
    /// * `NoRecordings` if `recordings` is empty
    /// * `Recording` wrapping the preprocessing failure of the first
    ///   offending recording; the whole table is abandoned
    pub fn build_for_frequency(
        &self,
        recordings: &[Recording],
        frequency_hz: u32,
    ) -> Result<FeatureTable, DatasetError> {
        if recordings.is_empty() {
            return Err(DatasetError::NoRecordings { frequency_hz });
        }

        let mut feature_names: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<f64>> = Vec::new();
        let mut labels = Vec::new();

        for recording in recordings {
            let wrap = |source: PreprocessingError| {
                log_preprocessing_error(&source, &recording.id());
                DatasetError::Recording {
                    recording: recording.id(),
                    frequency_hz,
                    source,
                }
            };

            for (features, class) in self.describe(recording, frequency_hz).map_err(wrap)? {
                match &feature_names {
                    None => feature_names = Some(features.names().to_vec()),
                    Some(names) if names.as_slice() != features.names() => {
                        return Err(wrap(PreprocessingError::ChannelMismatch {
                            names: names.len(),
                            columns: features.len(),
                        }));
                    }
                    Some(_) => {}
                }
                rows.push(features.into_values());
                labels.push(class.id());
            }
        }

        let feature_names = feature_names.unwrap_or_default();
        let n_rows = rows.len();
        let features = Array2::from_shape_fn((n_rows, feature_names.len()), |(r, c)| rows[r][c]);

        tracing::info!(
            "[DatasetBuilder] {} Hz: {} rows x {} features ({} mode)",
            frequency_hz,
            n_rows,
            feature_names.len(),
            self.mode
        );

        Ok(FeatureTable {
            frequency_hz,
            feature_names,
            features,
            labels,
            n_classes: self.mode.n_classes(),
        })
    }

    /// Build one table per frequency, in the given order
    pub fn build(
        &self,
        recordings: &[Recording],
        frequencies_hz: &[u32],
    ) -> Result<Vec<FeatureTable>, DatasetError> {
        frequencies_hz
            .iter()
            .map(|&f| self.build_for_frequency(recordings, f))
            .collect()
    }

    /// Feature vectors and labels contributed by one recording
    fn describe(
        &self,
        recording: &Recording,
        frequency_hz: u32,
    ) -> Result<Vec<(FeatureVector, ActivityClass)>, PreprocessingError> {
        let trimmed = trim_to_duration(&recording.signal, self.duration_ms)?;
        let signal = resample_to_frequency(&trimmed, frequency_hz as f64)?;
        let is_fall = recording.is_fall();

        match self.mode {
            ClassificationMode::Binary => {
                let class = if is_fall {
                    ActivityClass::Fall
                } else {
                    ActivityClass::Adl
                };
                Ok(vec![(self.extractor.extract(&signal)?, class)])
            }
            ClassificationMode::MultiClass => match self.segmenter.segment(&signal, is_fall)? {
                Segmentation::Activity(segment) => {
                    Ok(vec![(self.extractor.extract(&segment.signal)?, ActivityClass::Adl)])
                }
                Segmentation::Fall(phases) => Ok(vec![
                    (self.extractor.extract(&phases.event.signal)?, ActivityClass::Fall),
                    (
                        self.extractor.extract(&phases.pre_event.signal)?,
                        ActivityClass::PreFall,
                    ),
                    (
                        self.extractor.extract(&phases.post_event.signal)?,
                        ActivityClass::PostFall,
                    ),
                ]),
            },
        }
    }
}
