// FeatureExtractor - statistical and spectral features per sensor channel
//
// This module turns one signal segment into a flat, named feature vector.
// Every channel (plus optional magnitude channels) contributes the same
// eleven statistics.
//
// Module organization:
// - types: FeatureVector and the Statistic catalogue
// - fft: Power spectrum computation
// - spectral: PSD sum and spectral entropy
// - temporal: Mean, variance, std, median, extrema, ptp and quartiles
// - mod.rs: Coordinator (FeatureExtractor)
//
// Magnitude channels are derived for each consecutive triple of channels in
// layout order (acc_x/acc_y/acc_z -> mag_acc, gyro_x/... -> mag_gyro).

mod fft;
mod spectral;
mod temporal;
mod types;

use std::ops::Range;

pub use types::{FeatureVector, Statistic};

use fft::FftProcessor;
use spectral::SpectralFeatures;
use temporal::TemporalFeatures;

use crate::error::PreprocessingError;
use crate::signal::Signal;

/// FeatureExtractor coordinates per-channel feature computation
pub struct FeatureExtractor {
    fft_processor: FftProcessor,
    include_magnitude: bool,
}

impl FeatureExtractor {
    /// Create a new FeatureExtractor
    ///
    /// # Arguments
    /// * `include_magnitude` - Append a Euclidean-norm channel per channel triple
    pub fn new(include_magnitude: bool) -> Self {
        Self {
            fft_processor: FftProcessor::new(),
            include_magnitude,
        }
    }

    /// Channel names the extractor will produce features for, in order
    pub fn output_channels(&self, channels: &[String]) -> Vec<String> {
        let mut names = channels.to_vec();
        if self.include_magnitude {
            names.extend(magnitude_groups(channels).into_iter().map(|(name, _)| name));
        }
        names
    }

    /// Feature names for a channel layout, `{statistic}_{channel}`
    pub fn feature_names(&self, channels: &[String]) -> Vec<String> {
        let channels = self.output_channels(channels);
        Statistic::ALL
            .iter()
            .flat_map(|stat| channels.iter().map(move |ch| format!("{}_{}", stat, ch)))
            .collect()
    }

    /// Extract the feature vector of a segment
    ///
    /// # Arguments
    /// * `segment` - Signal window to describe
    ///
    /// # Returns
    /// Vector of length `11 × channel_count` (magnitude channels included)
    ///
    /// # Errors
    /// `EmptySignal` if the segment has no samples
    pub fn extract(&self, segment: &Signal) -> Result<FeatureVector, PreprocessingError> {
        if segment.is_empty() {
            return Err(PreprocessingError::EmptySignal);
        }

        let mut columns: Vec<Vec<f64>> = (0..segment.channel_count())
            .map(|i| segment.column(i).to_vec())
            .collect();

        if self.include_magnitude {
            for (_, group) in magnitude_groups(segment.channels()) {
                let magnitude = (0..segment.len())
                    .map(|row| {
                        columns[group.clone()]
                            .iter()
                            .map(|column| column[row].powi(2))
                            .sum::<f64>()
                            .sqrt()
                    })
                    .collect();
                columns.push(magnitude);
            }
        }

        let mut temporal = Vec::with_capacity(columns.len());
        let mut spectral = Vec::with_capacity(columns.len());
        for column in &columns {
            temporal.push(TemporalFeatures::compute(column).ok_or(PreprocessingError::EmptySignal)?);
            spectral.push(SpectralFeatures::compute(
                &self.fft_processor.power_spectrum(column),
            ));
        }

        let mut values = Vec::with_capacity(Statistic::ALL.len() * columns.len());
        for stat in Statistic::ALL {
            for (t, s) in temporal.iter().zip(&spectral) {
                values.push(match stat {
                    Statistic::Mean => t.mean,
                    Statistic::Variance => t.variance,
                    Statistic::StdDev => t.std_dev,
                    Statistic::Median => t.median,
                    Statistic::Max => t.max,
                    Statistic::Min => t.min,
                    Statistic::PeakToPeak => t.peak_to_peak,
                    Statistic::Percentile25 => t.percentile_25,
                    Statistic::Percentile75 => t.percentile_75,
                    Statistic::PsdSum => s.psd_sum,
                    Statistic::SpectralEntropy => s.entropy,
                });
            }
        }

        Ok(FeatureVector::new(
            self.feature_names(segment.channels()),
            values,
        ))
    }
}

/// Consecutive channel triples with the name of their norm channel
///
/// The axis suffix of the first channel is replaced by a `mag_` prefix. A
/// trailing group of fewer than three channels is normed as it is.
fn magnitude_groups(channels: &[String]) -> Vec<(String, Range<usize>)> {
    (0..channels.len())
        .step_by(3)
        .map(|start| {
            let first = channels[start].as_str();
            let stem = first.rsplit_once('_').map_or(first, |(stem, _)| stem);
            (format!("mag_{}", stem), start..(start + 3).min(channels.len()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SensorAxis;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn axis_names(count: usize) -> Vec<String> {
        SensorAxis::ALL[..count]
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    fn wave_signal(len: usize, channels: usize) -> Signal {
        let data = Array2::from_shape_fn((len, channels), |(i, c)| {
            ((i as f64) * 0.3 + c as f64).sin() * (c + 1) as f64
        });
        Signal::uniform(axis_names(channels), 5.0, data).unwrap()
    }

    #[test]
    fn test_vector_length_and_order() {
        let extractor = FeatureExtractor::new(false);
        let features = extractor.extract(&wave_signal(64, 3)).unwrap();
        assert_eq!(features.len(), 33);
        assert_eq!(features.names()[0], "mean_acc_x");
        assert_eq!(features.names()[1], "mean_acc_y");
        assert_eq!(features.names()[3], "var_acc_x");
        assert_eq!(features.names()[32], "pse_acc_z");
    }

    #[test]
    fn test_magnitude_channel_per_triple() {
        let extractor = FeatureExtractor::new(true);
        let six = extractor.extract(&wave_signal(32, 6)).unwrap();
        assert_eq!(six.len(), 11 * 8);
        assert_eq!(six.names()[6], "mean_mag_acc");
        assert_eq!(six.names()[7], "mean_mag_gyro");

        let nine = extractor.extract(&wave_signal(32, 9)).unwrap();
        assert_eq!(nine.len(), 11 * 12);
        assert!(nine.get("pse_mag_acc_2").is_some());
    }

    #[test]
    fn test_magnitude_channels_follow_layout_order() {
        let names: Vec<String> = [3, 4, 5, 0, 1, 2]
            .iter()
            .map(|&i| SensorAxis::ALL[i].name().to_string())
            .collect();
        let extractor = FeatureExtractor::new(true);
        let channels = extractor.output_channels(&names);
        assert_eq!(channels[6], "mag_gyro");
        assert_eq!(channels[7], "mag_acc");

        // gyro_x first: the gyroscope norm comes from columns 0..3
        let data = Array2::from_shape_fn((4, 6), |(_, c)| if c == 0 { 2.0 } else { 0.0 });
        let features = extractor
            .extract(&Signal::uniform(names, 5.0, data).unwrap())
            .unwrap();
        assert_eq!(features.get("mean_mag_gyro"), Some(2.0));
        assert_eq!(features.get("mean_mag_acc"), Some(0.0));
    }

    #[test]
    fn test_magnitude_values() {
        let data = Array2::from_shape_fn((4, 3), |(_, c)| if c == 0 { 3.0 } else if c == 1 { 4.0 } else { 0.0 });
        let signal = Signal::uniform(axis_names(3), 5.0, data).unwrap();
        let features = FeatureExtractor::new(true).extract(&signal).unwrap();
        assert_eq!(features.get("mean_mag_acc"), Some(5.0));
        assert_eq!(features.get("ptp_mag_acc"), Some(0.0));
    }

    #[test]
    fn test_constant_segment() {
        let data = Array2::from_elem((10, 3), 2.0);
        let signal = Signal::uniform(axis_names(3), 5.0, data).unwrap();
        let features = FeatureExtractor::new(false).extract(&signal).unwrap();
        assert_eq!(features.get("var_acc_x"), Some(0.0));
        assert_eq!(features.get("std_acc_y"), Some(0.0));
        assert_eq!(features.get("ptp_acc_z"), Some(0.0));
        assert_eq!(features.get("median_acc_x"), features.get("mean_acc_x"));
        // All power sits in the DC bin: (10 * 2)² / 10
        assert_abs_diff_eq!(features.get("psd_acc_x").unwrap(), 40.0, epsilon = 1e-9);
        assert!(features.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_segment_has_finite_entropy() {
        let signal = Signal::uniform(axis_names(3), 5.0, Array2::zeros((8, 3))).unwrap();
        let features = FeatureExtractor::new(true).extract(&signal).unwrap();
        assert_eq!(features.get("pse_acc_x"), Some(0.0));
        assert!(features.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_deterministic() {
        let extractor = FeatureExtractor::new(true);
        let signal = wave_signal(200, 9);
        let a = extractor.extract(&signal).unwrap();
        let b = extractor.extract(&signal).unwrap();
        assert_eq!(
            a.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.values().iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_empty_segment_rejected() {
        let signal = wave_signal(10, 3).slice(4..4);
        assert_eq!(
            FeatureExtractor::new(false).extract(&signal).unwrap_err(),
            PreprocessingError::EmptySignal
        );
    }

    #[test]
    fn test_feature_names_match_extraction() {
        let extractor = FeatureExtractor::new(true);
        let signal = wave_signal(16, 6);
        assert_eq!(
            extractor.feature_names(signal.channels()),
            extractor.extract(&signal).unwrap().names()
        );
    }
}
