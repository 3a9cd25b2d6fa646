use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::{Fft, FftPlanner};

pub(crate) use rustfft::num_complex::Complex64;

/// Forward and inverse transforms planned for one length.
///
/// Plans are `Send + Sync`, so one pair can be shared across rayon workers.
#[derive(Clone)]
pub(crate) struct FftPair {
    len: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl FftPair {
    pub(crate) fn new(len: usize) -> Self {
        let len = len.max(1);
        let mut planner = FftPlanner::new();
        Self {
            len,
            forward: planner.plan_fft_forward(len),
            inverse: planner.plan_fft_inverse(len),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn forward(&self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.forward.process(buffer);
    }

    /// Inverse transform scaled by `1 / len`.
    pub(crate) fn inverse(&self, buffer: &mut [Complex64]) {
        debug_assert_eq!(buffer.len(), self.len);
        self.inverse.process(buffer);
        let scale = 1.0 / self.len as f64;
        for value in buffer.iter_mut() {
            *value *= scale;
        }
    }

    /// Spectrum of a real signal, zero-padded (or truncated) to the planned length.
    pub(crate) fn real_spectrum(&self, signal: &[f64]) -> Vec<Complex64> {
        let mut buffer: Vec<Complex64> = (0..self.len)
            .map(|i| Complex64::new(signal.get(i).copied().unwrap_or(0.0), 0.0))
            .collect();
        self.forward(&mut buffer);
        buffer
    }
}

/// Generalized cosine window `a0 - (1 - a0) cos(2πn / N)`.
///
/// `periodic` uses `N = len` (spectral estimation), otherwise `N = len - 1` (filter design).
pub(crate) fn cosine_window(len: usize, a0: f64, periodic: bool) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0_f64; len.max(1)];
    }
    let denom = if periodic { len } else { len - 1 } as f64;
    (0..len)
        .map(|n| a0 - (1.0 - a0) * (2.0 * PI * n as f64 / denom).cos())
        .collect()
}

/// Transform length used for a linear convolution of `signal_len` and `kernel_len`.
pub(crate) fn convolution_len(signal_len: usize, kernel_len: usize) -> usize {
    (signal_len + kernel_len).saturating_sub(1).max(1).next_power_of_two()
}

/// Linear convolution trimmed to the centered `signal.len()` samples.
///
/// With an odd, symmetric kernel this is a zero-phase filter.
pub(crate) fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let fft = FftPair::new(convolution_len(signal.len(), kernel.len()));
    let kernel_spectrum = fft.real_spectrum(kernel);
    let mut buffer = fft.real_spectrum(signal);
    for (value, k) in buffer.iter_mut().zip(&kernel_spectrum) {
        *value *= k;
    }
    fft.inverse(&mut buffer);
    let offset = (kernel.len() - 1) / 2;
    buffer[offset..offset + signal.len()]
        .iter()
        .map(|value| value.re)
        .collect()
}
