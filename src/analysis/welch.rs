//! Welch power spectral density estimation.

use serde::{Deserialize, Serialize};

use super::AnalysisError;
use super::fft::{Complex64, FftPair, cosine_window};
use crate::recording::Recording;

/// Taper applied to each Welch segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Hann,
    #[default]
    Hamming,
}

impl WindowKind {
    pub(crate) fn coefficients(self, len: usize) -> Vec<f64> {
        match self {
            WindowKind::Hann => cosine_window(len, 0.5, true),
            WindowKind::Hamming => cosine_window(len, 0.54, true),
        }
    }
}

/// Welch estimator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WelchParams {
    pub fmin: f64,
    pub fmax: f64,
    pub n_fft: usize,
    pub n_overlap: usize,
    /// Segment length; `None` means `n_fft`.
    pub n_per_seg: Option<usize>,
    pub window: WindowKind,
}

impl Default for WelchParams {
    fn default() -> Self {
        Self {
            fmin: 1.0,
            fmax: 99.0,
            n_fft: 1024,
            n_overlap: 512,
            n_per_seg: None,
            window: WindowKind::Hamming,
        }
    }
}

impl WelchParams {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.n_fft == 0 {
            return Err(AnalysisError::InvalidWelch("n_fft must be positive".into()));
        }
        if let Some(seg) = self.n_per_seg {
            if seg == 0 || seg > self.n_fft {
                return Err(AnalysisError::InvalidWelch(format!(
                    "n_per_seg {seg} must be in 1..={}",
                    self.n_fft
                )));
            }
        }
        if !(self.fmin >= 0.0 && self.fmin <= self.fmax) {
            return Err(AnalysisError::InvalidWelch(format!(
                "frequency range {}..{} is empty",
                self.fmin, self.fmax
            )));
        }
        Ok(())
    }

    /// Segment layout for a signal of `n_samples`.
    ///
    /// Short signals shrink the segment (and FFT length) to the signal; an
    /// overlap that would not advance falls back to half a segment.
    pub(crate) fn plan(&self, n_samples: usize) -> SegmentPlan {
        let n_per_seg = self.n_per_seg.unwrap_or(self.n_fft).min(n_samples).max(1);
        let n_fft = self.n_fft.min(n_samples).max(n_per_seg);
        let overlap = if self.n_overlap >= n_per_seg {
            n_per_seg / 2
        } else {
            self.n_overlap
        };
        SegmentPlan {
            n_per_seg,
            n_fft,
            step: (n_per_seg - overlap).max(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentPlan {
    pub(crate) n_per_seg: usize,
    pub(crate) n_fft: usize,
    pub(crate) step: usize,
}

impl SegmentPlan {
    pub(crate) fn segment_starts(&self, n_samples: usize) -> impl Iterator<Item = usize> + '_ {
        let last = n_samples.saturating_sub(self.n_per_seg);
        (0..=last).step_by(self.step)
    }

    pub(crate) fn n_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    pub(crate) fn bin_frequencies(&self, sample_rate: f64) -> Vec<f64> {
        (0..self.n_bins())
            .map(|k| k as f64 * sample_rate / self.n_fft as f64)
            .collect()
    }
}

/// One-sided spectra of every detrended, windowed segment of `samples`.
pub(crate) fn segment_spectra(
    samples: &[f64],
    plan: &SegmentPlan,
    window: &[f64],
    fft: &FftPair,
) -> Vec<Vec<Complex64>> {
    let n_bins = plan.n_bins();
    plan.segment_starts(samples.len())
        .map(|start| {
            let segment = &samples[start..start + plan.n_per_seg];
            let offset = segment.iter().sum::<f64>() / segment.len() as f64;
            let tapered: Vec<f64> = segment
                .iter()
                .zip(window)
                .map(|(x, w)| (x - offset) * w)
                .collect();
            let mut spectrum = fft.real_spectrum(&tapered);
            spectrum.truncate(n_bins);
            spectrum
        })
        .collect()
}

/// Scale turning averaged `|X|²` into a one-sided density for bin `k`.
pub(crate) fn one_sided_density_scale(
    k: usize,
    plan: &SegmentPlan,
    sample_rate: f64,
    window: &[f64],
) -> f64 {
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let base = 1.0 / (sample_rate * window_power);
    let is_nyquist = plan.n_fft % 2 == 0 && k == plan.n_fft / 2;
    if k == 0 || is_nyquist { base } else { 2.0 * base }
}

/// Power spectral density for every channel over a shared frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub freqs: Vec<f64>,
    /// `psd[channel][bin]`, V²/Hz.
    pub psd: Vec<Vec<f64>>,
}

impl Spectrum {
    pub fn n_channels(&self) -> usize {
        self.psd.len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.psd.get(index).map(Vec::as_slice)
    }

    /// Sum of the PSD over every retained bin of one channel.
    pub fn total_power(&self, index: usize) -> f64 {
        self.channel(index).map_or(0.0, |psd| psd.iter().sum())
    }
}

/// Welch PSD of every channel in the recording.
pub fn welch_psd(recording: &Recording, params: &WelchParams) -> Result<Spectrum, AnalysisError> {
    welch_signals(recording.data(), recording.sample_rate(), params)
}

/// Welch PSD of equally long signals sampled at `sample_rate`.
pub fn welch_signals(
    signals: &[Vec<f64>],
    sample_rate: f64,
    params: &WelchParams,
) -> Result<Spectrum, AnalysisError> {
    params.validate()?;
    let n_samples = signals.first().map_or(0, Vec::len);
    if n_samples == 0 {
        return Err(AnalysisError::InvalidWelch("signal is empty".into()));
    }
    let plan = params.plan(n_samples);
    let window = params.window.coefficients(plan.n_per_seg);
    let fft = FftPair::new(plan.n_fft);
    let all_freqs = plan.bin_frequencies(sample_rate);
    let keep: Vec<usize> = all_freqs
        .iter()
        .enumerate()
        .filter(|(_, f)| **f >= params.fmin && **f <= params.fmax)
        .map(|(k, _)| k)
        .collect();

    let psd = signals
        .iter()
        .map(|signal| {
            let spectra = segment_spectra(signal, &plan, &window, &fft);
            let n_segments = spectra.len().max(1) as f64;
            keep.iter()
                .map(|&k| {
                    let power: f64 = spectra.iter().map(|s| s[k].norm_sqr()).sum();
                    power / n_segments * one_sided_density_scale(k, &plan, sample_rate, &window)
                })
                .collect()
        })
        .collect();

    Ok(Spectrum {
        freqs: keep.iter().map(|&k| all_freqs[k]).collect(),
        psd,
    })
}
