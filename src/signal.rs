//! Multi-channel sensor signal model.
//!
//! A [`Signal`] is a samples × channels matrix sharing one strictly
//! increasing timestamp axis. Recordings from the acquisition layer wrap a
//! signal together with the subject/activity/trial identity used for
//! labelling.

use std::fmt;
use std::ops::Range;

use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::PreprocessingError;

/// One of the nine axes recorded by the SisFall wearable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorAxis {
    AccX,
    AccY,
    AccZ,
    GyroX,
    GyroY,
    GyroZ,
    Acc2X,
    Acc2Y,
    Acc2Z,
}

impl SensorAxis {
    pub const ALL: [SensorAxis; 9] = [
        SensorAxis::AccX,
        SensorAxis::AccY,
        SensorAxis::AccZ,
        SensorAxis::GyroX,
        SensorAxis::GyroY,
        SensorAxis::GyroZ,
        SensorAxis::Acc2X,
        SensorAxis::Acc2Y,
        SensorAxis::Acc2Z,
    ];

    /// Axis for a column index of the raw recording (0..=8)
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Column name used in feature names, e.g. `acc_x`
    pub fn name(self) -> &'static str {
        match self {
            SensorAxis::AccX => "acc_x",
            SensorAxis::AccY => "acc_y",
            SensorAxis::AccZ => "acc_z",
            SensorAxis::GyroX => "gyro_x",
            SensorAxis::GyroY => "gyro_y",
            SensorAxis::GyroZ => "gyro_z",
            SensorAxis::Acc2X => "acc_2_x",
            SensorAxis::Acc2Y => "acc_2_y",
            SensorAxis::Acc2Z => "acc_2_z",
        }
    }

    pub fn group(self) -> SensorGroup {
        match self.index() / 3 {
            0 => SensorGroup::Accelerometer,
            1 => SensorGroup::Gyroscope,
            _ => SensorGroup::SecondaryAccelerometer,
        }
    }
}

impl fmt::Display for SensorAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A 3-axis sensor of the wearable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorGroup {
    Accelerometer,
    Gyroscope,
    SecondaryAccelerometer,
}

impl SensorGroup {
    /// Scale factor from raw ADC counts to physical units
    ///
    /// Accelerometers map to g, the gyroscope to rad/s.
    pub fn conversion_factor(self) -> f64 {
        match self {
            SensorGroup::Accelerometer => (2.0 * 16.0) / 8192.0,
            SensorGroup::Gyroscope => (2.0 * 2000.0) / 65536.0 * (std::f64::consts::PI / 180.0),
            SensorGroup::SecondaryAccelerometer => (2.0 * 8.0) / 16384.0,
        }
    }
}

/// Time-indexed multi-channel signal
///
/// Rows are samples, columns are channels. All channels share
/// `timestamps_ms`, which is strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    channels: Vec<String>,
    timestamps_ms: Vec<f64>,
    period_ms: f64,
    data: Array2<f64>,
}

impl Signal {
    /// Create a signal from explicit timestamps
    ///
    /// # Errors
    /// * `EmptySignal` if there are no samples
    /// * `ChannelMismatch` if `channels` and data columns disagree
    /// * `InvalidTimestamps` if timestamps do not match the rows or are not
    ///   strictly increasing
    pub fn new(
        channels: Vec<String>,
        timestamps_ms: Vec<f64>,
        period_ms: f64,
        data: Array2<f64>,
    ) -> Result<Self, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptySignal);
        }
        if channels.len() != data.ncols() {
            return Err(PreprocessingError::ChannelMismatch {
                names: channels.len(),
                columns: data.ncols(),
            });
        }
        if timestamps_ms.len() != data.nrows() {
            return Err(PreprocessingError::InvalidTimestamps {
                reason: format!(
                    "{} timestamps for {} samples",
                    timestamps_ms.len(),
                    data.nrows()
                ),
            });
        }
        if timestamps_ms.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(PreprocessingError::InvalidTimestamps {
                reason: "timestamps are not strictly increasing".to_string(),
            });
        }
        if period_ms.is_nan() || period_ms <= 0.0 {
            return Err(PreprocessingError::InvalidTimestamps {
                reason: format!("sampling period {} ms is not positive", period_ms),
            });
        }

        Ok(Self {
            channels,
            timestamps_ms,
            period_ms,
            data,
        })
    }

    /// Create a signal sampled every `period_ms`, starting at t = 0
    pub fn uniform(
        channels: Vec<String>,
        period_ms: f64,
        data: Array2<f64>,
    ) -> Result<Self, PreprocessingError> {
        let timestamps_ms = (0..data.nrows()).map(|i| i as f64 * period_ms).collect();
        Self::new(channels, timestamps_ms, period_ms, data)
    }

    /// Build from parts already known to be consistent
    pub(crate) fn from_parts(
        channels: Vec<String>,
        timestamps_ms: Vec<f64>,
        period_ms: f64,
        data: Array2<f64>,
    ) -> Self {
        debug_assert_eq!(timestamps_ms.len(), data.nrows());
        debug_assert_eq!(channels.len(), data.ncols());
        Self {
            channels,
            timestamps_ms,
            period_ms,
            data,
        }
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn channel_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn timestamps_ms(&self) -> &[f64] {
        &self.timestamps_ms
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Native sampling rate in Hz
    pub fn sampling_rate_hz(&self) -> f64 {
        1000.0 / self.period_ms
    }

    pub fn data(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn column(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.column(index)
    }

    /// Contiguous sub-range of samples, keeping the original timestamps
    ///
    /// The range may be empty; callers that need samples check `is_empty`.
    pub fn slice(&self, range: Range<usize>) -> Signal {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        Signal {
            channels: self.channels.clone(),
            timestamps_ms: self.timestamps_ms[start..end].to_vec(),
            period_ms: self.period_ms,
            data: self.data.slice(s![start..end, ..]).to_owned(),
        }
    }

    /// Per-sample Euclidean norm across every channel
    pub fn magnitude(&self) -> Vec<f64> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| row.iter().map(|v| v * v).sum::<f64>().sqrt())
            .collect()
    }
}

/// One labelled activity recording
#[derive(Debug, Clone)]
pub struct Recording {
    /// Subject folder name, e.g. `SA01`
    pub subject: String,
    /// Activity code, e.g. `D01` or `F05`
    pub activity: String,
    /// Trial code, e.g. `R01`
    pub trial: String,
    /// Window number for long activities split into several recordings
    pub window: Option<usize>,
    pub signal: Signal,
}

impl Recording {
    pub fn new(subject: &str, activity: &str, trial: &str, signal: Signal) -> Self {
        Self {
            subject: subject.to_string(),
            activity: activity.to_string(),
            trial: trial.to_string(),
            window: None,
            signal,
        }
    }

    /// Falls are the activities whose code starts with `F`
    pub fn is_fall(&self) -> bool {
        self.activity.starts_with('F')
    }

    /// Stable identifier used in logs and errors
    pub fn id(&self) -> String {
        match self.window {
            Some(window) => format!(
                "{}/{}/{}#{}",
                self.subject, self.activity, self.trial, window
            ),
            None => format!("{}/{}/{}", self.subject, self.activity, self.trial),
        }
    }
}
