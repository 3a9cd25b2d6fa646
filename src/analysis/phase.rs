//! Instantaneous phase estimation for phase-synchrony measures.

use serde::{Deserialize, Serialize};

use super::fft::{Complex64, FftPair};

/// How per-sample phase is derived from a band-limited signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhasePolicy {
    /// Angle of the analytic signal (Hilbert transform).
    #[default]
    Analytic,
    /// Angle of the signal's FFT bins, one per sample index. Kept for
    /// comparison with feature tables produced that way.
    FftAngle,
}

impl PhasePolicy {
    pub fn name(self) -> &'static str {
        match self {
            PhasePolicy::Analytic => "analytic",
            PhasePolicy::FftAngle => "fft_angle",
        }
    }
}

/// Phase in radians for every sample of `signal`.
pub fn instantaneous_phase(signal: &[f64], policy: PhasePolicy) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let fft = FftPair::new(signal.len());
    match policy {
        PhasePolicy::FftAngle => fft.real_spectrum(signal).iter().map(|c| c.arg()).collect(),
        PhasePolicy::Analytic => analytic_signal(signal, &fft)
            .iter()
            .map(|c| c.arg())
            .collect(),
    }
}

/// `x + i·H{x}` computed by zeroing negative frequencies.
pub(crate) fn analytic_signal(signal: &[f64], fft: &FftPair) -> Vec<Complex64> {
    let n = fft.len();
    let mut spectrum = fft.real_spectrum(signal);
    for (k, value) in spectrum.iter_mut().enumerate() {
        let gain = if k == 0 || (n % 2 == 0 && k == n / 2) {
            1.0
        } else if k < n.div_ceil(2) {
            2.0
        } else {
            0.0
        };
        *value *= gain;
    }
    fft.inverse(&mut spectrum);
    spectrum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn analytic_phase_of_cosine_advances_linearly() {
        let n = 256;
        let cycles = 8.0;
        let signal: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * cycles * i as f64 / n as f64).cos())
            .collect();
        let phase = instantaneous_phase(&signal, PhasePolicy::Analytic);
        for (i, p) in phase.iter().enumerate() {
            let expected = 2.0 * PI * cycles * i as f64 / n as f64;
            let gap = Complex64::from_polar(1.0, *p) - Complex64::from_polar(1.0, expected);
            assert!(gap.norm() < 1e-6, "sample {i}: {p} vs {expected}");
        }
    }

    #[test]
    fn analytic_signal_keeps_real_part() {
        let signal = [0.3, -1.0, 2.0, 0.5, -0.25, 1.5, 0.0];
        let fft = FftPair::new(signal.len());
        let analytic = analytic_signal(&signal, &fft);
        for (a, x) in analytic.iter().zip(signal) {
            assert!((a.re - x).abs() < 1e-9);
        }
    }

    #[test]
    fn fft_angle_has_one_value_per_sample() {
        let phase = instantaneous_phase(&[1.0, 1.0, 1.0, 1.0], PhasePolicy::FftAngle);
        assert_eq!(phase.len(), 4);
        assert!(phase[0].abs() < 1e-12);
        assert_eq!(PhasePolicy::default().name(), "analytic");
    }
}
