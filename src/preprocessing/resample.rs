// Resampler - duration trimming and frequency re-gridding
//
// Trimming removes samples symmetrically from both ends; when the excess is
// odd the leftover sample always comes off the tail. Re-gridding places a
// sample every 1000/f ms across the original time span and estimates each
// value by linear interpolation between the bracketing input samples, which
// covers both upsampling and downsampling.

use ndarray::Array2;

use crate::error::PreprocessingError;
use crate::signal::Signal;

/// Tolerance absorbing floating-point error in sample-count arithmetic
const COUNT_EPSILON: f64 = 1e-9;

/// Trim a signal symmetrically to `duration_ms`
///
/// The retained count is `duration_ms × native_rate / 1000` (rounded down).
///
/// # Errors
/// `InvalidDuration` if the retained count would be zero/negative or exceed
/// the signal length.
pub fn trim_to_duration(signal: &Signal, duration_ms: f64) -> Result<Signal, PreprocessingError> {
    let len = signal.len();
    let target = (duration_ms * signal.sampling_rate_hz() / 1000.0 + COUNT_EPSILON).floor();
    let target_count = if target.is_finite() {
        target as i64
    } else {
        0
    };

    if target_count <= 0 || target_count > len as i64 {
        return Err(PreprocessingError::InvalidDuration {
            duration_ms,
            target_count,
            available: len,
        });
    }

    let target_count = target_count as usize;
    let excess = len - target_count;
    let head = excess / 2;
    let tail = if (target_count + len) % 2 == 0 {
        head
    } else {
        head + 1
    };

    Ok(signal.slice(head..len - tail))
}

/// Re-grid a signal to `frequency_hz` using linear interpolation
///
/// Grid points start at the first timestamp and step by `1000 / frequency_hz`
/// ms up to the last timestamp, so a signal spanning `D` ms yields about
/// `D × f / 1000` samples.
///
/// # Errors
/// * `InvalidFrequency` if `frequency_hz` is not a positive finite number
/// * `EmptySignal` if the signal has no samples
pub fn resample_to_frequency(
    signal: &Signal,
    frequency_hz: f64,
) -> Result<Signal, PreprocessingError> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return Err(PreprocessingError::InvalidFrequency { frequency_hz });
    }
    if signal.is_empty() {
        return Err(PreprocessingError::EmptySignal);
    }

    let period_ms = 1000.0 / frequency_hz;
    let timestamps = signal.timestamps_ms();
    let start = timestamps[0];
    let end = timestamps[timestamps.len() - 1];
    let steps = ((end - start) / period_ms + COUNT_EPSILON).floor() as usize;
    let grid: Vec<f64> = (0..=steps)
        .map(|k| (start + k as f64 * period_ms).min(end))
        .collect();

    let source = signal.data();
    let channels = signal.channel_count();
    let mut data = Array2::zeros((grid.len(), channels));
    let mut cursor = 0;

    for (row, &t) in grid.iter().enumerate() {
        while cursor + 1 < timestamps.len() && timestamps[cursor + 1] <= t {
            cursor += 1;
        }

        if cursor + 1 == timestamps.len() || timestamps[cursor] == t {
            data.row_mut(row).assign(&source.row(cursor));
            continue;
        }

        let (t0, t1) = (timestamps[cursor], timestamps[cursor + 1]);
        let weight = (t - t0) / (t1 - t0);
        for ch in 0..channels {
            let (v0, v1) = (source[[cursor, ch]], source[[cursor + 1, ch]]);
            data[[row, ch]] = v0 + weight * (v1 - v0);
        }
    }

    tracing::trace!(
        "[Resampler] {} samples @ {:.1} Hz -> {} samples @ {} Hz",
        signal.len(),
        signal.sampling_rate_hz(),
        grid.len(),
        frequency_hz
    );

    Ok(Signal::from_parts(
        signal.channels().to_vec(),
        grid,
        period_ms,
        data,
    ))
}
