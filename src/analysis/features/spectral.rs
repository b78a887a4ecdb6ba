// Spectral module - Frequency-domain statistics
//
// Both statistics work on the power spectrum `|FFT(x)|² / N`. Bins with zero
// power contribute exactly zero to the entropy instead of `0 · ln 0`.

/// Frequency-domain statistics of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralFeatures {
    /// Σ psd_k
    pub psd_sum: f64,
    /// −Σ psd_k · ln(psd_k)
    pub entropy: f64,
}

impl SpectralFeatures {
    pub fn compute(power_spectrum: &[f64]) -> Self {
        Self {
            psd_sum: power_spectrum.iter().sum(),
            entropy: compute_entropy(power_spectrum),
        }
    }
}

/// Spectral entropy of a power spectrum
///
/// Non-positive or non-finite logarithms count as zero contribution.
pub fn compute_entropy(power_spectrum: &[f64]) -> f64 {
    -power_spectrum
        .iter()
        .map(|&p| {
            if p > 0.0 {
                let term = p * p.ln();
                if term.is_finite() {
                    term
                } else {
                    0.0
                }
            } else {
                0.0
            }
        })
        .sum::<f64>()
}
