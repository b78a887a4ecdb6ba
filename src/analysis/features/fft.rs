// FFT module - Power spectrum computation
//
// The full-length spectrum is used (no windowing, no padding) so that the
// spectral statistics see every bin of the channel's transform.

use rustfft::{num_complex::Complex, FftPlanner};
use std::sync::{Arc, Mutex};

/// FFT processor producing power spectra of real-valued channels
pub struct FftProcessor {
    fft_planner: Arc<Mutex<FftPlanner<f64>>>,
}

impl FftProcessor {
    pub fn new() -> Self {
        Self {
            fft_planner: Arc::new(Mutex::new(FftPlanner::new())),
        }
    }

    /// Compute the power spectrum `|FFT(x)|² / N` over all N bins
    ///
    /// # Arguments
    /// * `samples` - One channel of a segment
    ///
    /// # Returns
    /// Power per bin (empty for empty input)
    pub fn power_spectrum(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let mut buffer: Vec<Complex<f64>> =
            samples.iter().map(|&x| Complex::new(x, 0.0)).collect();

        let fft = {
            // Plan cache stays valid after a poisoning panic
            let mut planner = self
                .fft_planner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            planner.plan_fft_forward(n)
        };
        fft.process(&mut buffer);

        buffer.iter().map(|c| c.norm_sqr() / n as f64).collect()
    }
}

impl Default for FftProcessor {
    fn default() -> Self {
        Self::new()
    }
}
