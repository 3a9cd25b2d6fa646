//! Morlet wavelet time-frequency power.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::AnalysisError;
use super::fft::{Complex64, FftPair, convolution_len};
use crate::bands::Band;
use crate::recording::Recording;

/// Frequency grid and wavelet widths for the decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorletParams {
    pub freqs: Vec<f64>,
    /// Cycles per wavelet, one per frequency.
    pub n_cycles: Vec<f64>,
    /// Keep every `decim`-th time sample before averaging.
    pub decim: usize,
}

impl Default for MorletParams {
    fn default() -> Self {
        Self::linear(1.0, 50.0, 1.0)
    }
}

impl MorletParams {
    /// Evenly spaced grid `start..=stop` with `n_cycles = f / 2`.
    pub fn linear(start: f64, stop: f64, step: f64) -> Self {
        let mut freqs = Vec::new();
        if step > 0.0 {
            let mut f = start;
            while f <= stop + step * 1e-9 {
                freqs.push(f);
                f += step;
            }
        }
        let n_cycles = freqs.iter().map(|f| f / 2.0).collect();
        Self {
            freqs,
            n_cycles,
            decim: 1,
        }
    }

    pub fn validate(&self, sample_rate: f64) -> Result<(), AnalysisError> {
        if self.freqs.is_empty() {
            return Err(AnalysisError::EmptyFrequencyGrid);
        }
        if self.freqs.len() != self.n_cycles.len() {
            return Err(AnalysisError::FrequencyGridMismatch {
                freqs: self.freqs.len(),
                cycles: self.n_cycles.len(),
            });
        }
        if self.decim == 0 {
            return Err(AnalysisError::InvalidDecimation);
        }
        let nyquist = sample_rate / 2.0;
        for (&freq, &cycles) in self.freqs.iter().zip(&self.n_cycles) {
            if !(freq > 0.0 && freq < nyquist) {
                return Err(AnalysisError::InvalidFrequency { freq, nyquist });
            }
            if !(cycles > 0.0) {
                return Err(AnalysisError::InvalidCycles(cycles));
            }
        }
        Ok(())
    }
}

/// Time-averaged wavelet power, `power[channel][freq]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrequencyPower {
    pub freqs: Vec<f64>,
    pub power: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MorletBandFeatures {
    pub channel: String,
    pub band: &'static str,
    /// NaN when no grid frequency falls inside the band.
    pub power_tfr_morlet: f64,
}

/// Complex Morlet wavelet with unit energy scaled by `sqrt(2)`.
pub(crate) fn morlet_wavelet(freq: f64, n_cycles: f64, sample_rate: f64) -> Vec<Complex64> {
    let sigma_t = n_cycles / (2.0 * PI * freq);
    let half = (5.0 * sigma_t * sample_rate).ceil() as i64;
    let mut wavelet: Vec<Complex64> = (-half..=half)
        .filter(|i| (i.abs() as f64) / sample_rate < 5.0 * sigma_t || *i == 0)
        .map(|i| {
            let t = i as f64 / sample_rate;
            let envelope = (-t * t / (2.0 * sigma_t * sigma_t)).exp();
            Complex64::from_polar(envelope, 2.0 * PI * freq * t)
        })
        .collect();
    let norm = wavelet.iter().map(|w| w.norm_sqr()).sum::<f64>().sqrt();
    let scale = 2.0_f64.sqrt() / norm;
    for w in wavelet.iter_mut() {
        *w *= scale;
    }
    wavelet
}

/// Wavelet power for every channel and grid frequency, averaged over time.
pub fn morlet_power(
    recording: &Recording,
    params: &MorletParams,
) -> Result<TimeFrequencyPower, AnalysisError> {
    let fs = recording.sample_rate();
    params.validate(fs)?;
    let n = recording.n_samples();
    let wavelets: Vec<Vec<Complex64>> = params
        .freqs
        .iter()
        .zip(&params.n_cycles)
        .map(|(&f, &c)| morlet_wavelet(f, c, fs))
        .collect();
    let longest = wavelets.iter().map(Vec::len).max().unwrap_or(1);
    let fft = FftPair::new(convolution_len(n, longest));
    let wavelet_spectra: Vec<Vec<Complex64>> = wavelets
        .iter()
        .map(|w| {
            let mut buffer = w.clone();
            buffer.resize(fft.len(), Complex64::new(0.0, 0.0));
            fft.forward(&mut buffer);
            buffer
        })
        .collect();

    let power = recording
        .channels()
        .map(|channel| {
            let signal_spectrum = fft.real_spectrum(channel.samples);
            wavelet_spectra
                .iter()
                .zip(&wavelets)
                .map(|(spectrum, wavelet)| {
                    let mut buffer: Vec<Complex64> = signal_spectrum
                        .iter()
                        .zip(spectrum)
                        .map(|(x, w)| x * w)
                        .collect();
                    fft.inverse(&mut buffer);
                    let offset = (wavelet.len() - 1) / 2;
                    let kept: Vec<f64> = buffer[offset..offset + n]
                        .iter()
                        .step_by(params.decim)
                        .map(|c| c.norm_sqr())
                        .collect();
                    kept.iter().sum::<f64>() / kept.len().max(1) as f64
                })
                .collect()
        })
        .collect();

    Ok(TimeFrequencyPower {
        freqs: params.freqs.clone(),
        power,
    })
}

/// Band-averaged Morlet power, channel-major in recording order.
pub fn extract_morlet_features(
    recording: &Recording,
    bands: &[Band],
    params: &MorletParams,
) -> Result<Vec<MorletBandFeatures>, AnalysisError> {
    let tfr = morlet_power(recording, params)?;
    for band in bands {
        if band.bin_indices(&tfr.freqs).is_empty() {
            warn!(band = band.name, "No wavelet frequency inside band; band power is NaN");
        }
    }
    let mut rows = Vec::with_capacity(recording.n_channels() * bands.len());
    for (channel, power) in recording.channels().zip(&tfr.power) {
        for band in bands {
            rows.push(MorletBandFeatures {
                channel: channel.name.to_string(),
                band: band.name,
                power_tfr_morlet: band.mean_over(&tfr.freqs, power).unwrap_or(f64::NAN),
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{ALPHA, BETA, GAMMA_HIGH, STANDARD_BANDS};

    fn alpha_recording() -> Recording {
        let fs = 256.0;
        let tone: Vec<f64> = (0..1024).map(|i| (2.0 * PI * 10.0 * i as f64 / fs).sin()).collect();
        Recording::new(vec!["O1".into()], fs, vec![tone]).unwrap()
    }

    #[test]
    fn default_grid_is_one_to_fifty() {
        let params = MorletParams::default();
        assert_eq!(params.freqs.len(), 50);
        assert_eq!(params.freqs[0], 1.0);
        assert_eq!(params.freqs[49], 50.0);
        assert_eq!(params.n_cycles[9], 5.0);
    }

    #[test]
    fn wavelet_is_symmetric_with_fixed_energy() {
        let w = morlet_wavelet(10.0, 5.0, 256.0);
        assert_eq!(w.len() % 2, 1);
        let energy: f64 = w.iter().map(|c| c.norm_sqr()).sum();
        assert!((energy - 2.0).abs() < 1e-9);
        let mid = w.len() / 2;
        assert!((w[mid].im).abs() < 1e-12);
    }

    #[test]
    fn tone_concentrates_in_its_band() {
        let params = MorletParams::linear(1.0, 45.0, 1.0);
        let rows = extract_morlet_features(&alpha_recording(), &STANDARD_BANDS, &params).unwrap();
        assert_eq!(rows.len(), 6);
        let alpha = rows.iter().find(|r| r.band == ALPHA.name).unwrap();
        let beta = rows.iter().find(|r| r.band == BETA.name).unwrap();
        assert!(alpha.power_tfr_morlet > 10.0 * beta.power_tfr_morlet);
        let high = rows.iter().find(|r| r.band == GAMMA_HIGH.name).unwrap();
        assert!(high.power_tfr_morlet.is_nan());
    }

    #[test]
    fn decimation_keeps_band_power_close() {
        let full = morlet_power(&alpha_recording(), &MorletParams::linear(8.0, 12.0, 1.0)).unwrap();
        let params = MorletParams {
            decim: 4,
            ..MorletParams::linear(8.0, 12.0, 1.0)
        };
        let decimated = morlet_power(&alpha_recording(), &params).unwrap();
        let a = full.power[0][2];
        let b = decimated.power[0][2];
        assert!((a - b).abs() / a < 0.05);
    }

    #[test]
    fn rejects_bad_grids() {
        let recording = alpha_recording();
        let mismatch = MorletParams {
            freqs: vec![4.0, 8.0],
            n_cycles: vec![2.0],
            decim: 1,
        };
        assert_eq!(
            morlet_power(&recording, &mismatch),
            Err(AnalysisError::FrequencyGridMismatch { freqs: 2, cycles: 1 })
        );
        let negative = MorletParams {
            freqs: vec![-1.0],
            n_cycles: vec![1.0],
            decim: 1,
        };
        assert!(matches!(
            morlet_power(&recording, &negative),
            Err(AnalysisError::InvalidFrequency { .. })
        ));
        let empty = MorletParams {
            freqs: vec![],
            n_cycles: vec![],
            decim: 1,
        };
        assert_eq!(morlet_power(&recording, &empty), Err(AnalysisError::EmptyFrequencyGrid));
    }
}
