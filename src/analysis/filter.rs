//! Zero-phase FIR band-pass filtering.

use std::f64::consts::PI;

use super::AnalysisError;
use super::fft::{convolve_same, cosine_window};

/// Windowed-sinc (Hamming) band-pass filter.
///
/// Transition widths follow the usual EEG defaults: a quarter of the edge
/// frequency, at least 2 Hz, never wider than the distance to 0 or Nyquist.
/// The filter length is `3.3 / transition` seconds rounded up to an odd tap count,
/// so the centered convolution adds no phase shift.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPassFilter {
    taps: Vec<f64>,
}

impl BandPassFilter {
    pub fn design(low_hz: f64, high_hz: f64, sample_rate: f64) -> Result<Self, AnalysisError> {
        let nyquist = sample_rate / 2.0;
        if !(low_hz >= 0.0 && high_hz > low_hz && high_hz < nyquist) {
            return Err(AnalysisError::InvalidPassBand {
                low: low_hz,
                high: high_hz,
                sample_rate,
            });
        }
        let low_trans = (0.25 * low_hz).max(2.0).min(low_hz);
        let high_trans = (0.25 * high_hz).max(2.0).min(nyquist - high_hz);
        let narrowest = if low_trans > 0.0 {
            low_trans.min(high_trans)
        } else {
            high_trans
        };
        let mut len = (3.3 * sample_rate / narrowest).ceil() as usize;
        if len % 2 == 0 {
            len += 1;
        }

        let f_low = (low_hz - low_trans / 2.0) / sample_rate;
        let f_high = (high_hz + high_trans / 2.0) / sample_rate;
        let window = cosine_window(len, 0.54, false);
        let center = (len - 1) as f64 / 2.0;
        let taps = window
            .iter()
            .enumerate()
            .map(|(n, w)| {
                let m = n as f64 - center;
                let low_pass_high = 2.0 * f_high * sinc(2.0 * f_high * m);
                let low_pass_low = if low_hz > 0.0 {
                    2.0 * f_low * sinc(2.0 * f_low * m)
                } else {
                    0.0
                };
                w * (low_pass_high - low_pass_low)
            })
            .collect();
        Ok(Self { taps })
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn apply(&self, signal: &[f64]) -> Vec<f64> {
        convolve_same(signal, &self.taps)
    }
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        (PI * x).sin() / (PI * x)
    }
}
