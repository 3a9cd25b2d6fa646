use rayon::prelude::*;
use serde::Serialize;

use super::{BandSelection, ConnectivityParams, PairMatrix, channel_pairs};
use crate::analysis::AnalysisError;
use crate::analysis::fft::{Complex64, FftPair};
use crate::analysis::moments::ratio_or_nan;
use crate::analysis::welch::{WelchParams, WindowKind, segment_spectra};
use crate::bands::Band;
use crate::recording::Recording;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoherenceFeatures {
    pub channel_1: String,
    pub channel_2: String,
    pub band: &'static str,
    /// NaN when the band holds no frequency bin or a channel is flat.
    pub coherence: f64,
}

/// Per-channel segment spectra on a shared frequency grid.
struct CrossSpectra {
    freqs: Vec<f64>,
    segments: Vec<Vec<Vec<Complex64>>>,
}

impl CrossSpectra {
    fn compute(recording: &Recording, nperseg: usize) -> Result<Self, AnalysisError> {
        let welch = WelchParams {
            fmin: 0.0,
            fmax: f64::INFINITY,
            n_fft: nperseg,
            n_overlap: nperseg / 2,
            n_per_seg: None,
            window: WindowKind::Hann,
        };
        welch.validate()?;
        let plan = welch.plan(recording.n_samples());
        let window = welch.window.coefficients(plan.n_per_seg);
        let fft = FftPair::new(plan.n_fft);
        let segments = recording
            .data()
            .par_iter()
            .map(|samples| segment_spectra(samples, &plan, &window, &fft))
            .collect();
        Ok(Self {
            freqs: plan.bin_frequencies(recording.sample_rate()),
            segments,
        })
    }

    /// Magnitude-squared coherence of channels `a` and `b` averaged over `bins`.
    fn band_coherence(&self, a: usize, b: usize, bins: &[usize]) -> f64 {
        if bins.is_empty() {
            return f64::NAN;
        }
        let (xs, ys) = (&self.segments[a], &self.segments[b]);
        let total: f64 = bins
            .iter()
            .map(|&k| {
                let mut cross = Complex64::new(0.0, 0.0);
                let (mut auto_x, mut auto_y) = (0.0, 0.0);
                for (x, y) in xs.iter().zip(ys) {
                    cross += x[k].conj() * y[k];
                    auto_x += x[k].norm_sqr();
                    auto_y += y[k].norm_sqr();
                }
                ratio_or_nan(cross.norm_sqr(), auto_x * auto_y)
            })
            .sum();
        total / bins.len() as f64
    }
}

/// Band-averaged coherence for every channel pair.
pub fn coherence_matrix(
    recording: &Recording,
    band: &Band,
    nperseg: usize,
) -> Result<PairMatrix, AnalysisError> {
    let spectra = CrossSpectra::compute(recording, nperseg)?;
    Ok(pair_matrix(&spectra, recording.n_channels(), band))
}

fn pair_matrix(spectra: &CrossSpectra, n_channels: usize, band: &Band) -> PairMatrix {
    let bins = band.bin_indices(&spectra.freqs);
    let values = channel_pairs(n_channels)
        .into_par_iter()
        .map(|(i, j)| spectra.band_coherence(i, j, &bins))
        .collect();
    PairMatrix::from_pair_values(n_channels, values)
}

/// One row per pair, band-major, over the first `max_channels` channels.
pub fn extract_coherence_features(
    recording: &Recording,
    selection: BandSelection<'_>,
    params: &ConnectivityParams,
) -> Result<Vec<CoherenceFeatures>, AnalysisError> {
    let capped = recording.first_channels(params.max_channels);
    let spectra = CrossSpectra::compute(&capped, params.nperseg)?;
    let names = capped.channel_names();
    let pairs = channel_pairs(capped.n_channels());
    let mut rows = Vec::with_capacity(pairs.len() * selection.bands().len());
    for band in selection.bands() {
        let matrix = pair_matrix(&spectra, capped.n_channels(), band);
        for (&(i, j), &coherence) in pairs.iter().zip(matrix.pair_values()) {
            rows.push(CoherenceFeatures {
                channel_1: names[i].clone(),
                channel_2: names[j].clone(),
                band: band.name,
                coherence,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{ALPHA, GAMMA_HIGH};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    fn recording() -> Recording {
        let fs = 256.0;
        let n = 4096;
        let mut rng = StdRng::seed_from_u64(7);
        let shared: Vec<f64> = (0..n)
            .map(|i| (2.0 * PI * 10.0 * i as f64 / fs).sin() + rng.random::<f64>() - 0.5)
            .collect();
        let echo: Vec<f64> = shared
            .iter()
            .map(|v| 0.5 * v + 0.05 * (rng.random::<f64>() - 0.5))
            .collect();
        let noise: Vec<f64> = (0..n).map(|_| rng.random::<f64>() - 0.5).collect();
        Recording::new(
            vec!["C3".into(), "C4".into(), "Oz".into()],
            fs,
            vec![shared, echo, noise],
        )
        .unwrap()
    }

    #[test]
    fn correlated_channels_are_coherent() {
        let matrix = coherence_matrix(&recording(), &ALPHA, 256).unwrap();
        let related = matrix.get(0, 1).unwrap();
        let unrelated = matrix.get(0, 2).unwrap();
        assert!(related > 0.9, "related {related}");
        assert!(unrelated < related);
        assert_eq!(matrix.get(1, 0), Some(related));
    }

    #[test]
    fn values_stay_in_unit_interval() {
        let rows = extract_coherence_features(
            &recording(),
            BandSelection::Single(&ALPHA),
            &ConnectivityParams {
                nperseg: 256,
                ..ConnectivityParams::default()
            },
        )
        .unwrap();
        assert_eq!(rows.len(), 3);
        for row in rows {
            assert!((0.0..=1.0 + 1e-9).contains(&row.coherence), "{row:?}");
        }
    }

    #[test]
    fn band_above_nyquist_is_nan() {
        let fs = 64.0;
        let samples: Vec<f64> = (0..512).map(|i| (i as f64 * 0.3).sin()).collect();
        let recording =
            Recording::new(vec!["A".into(), "B".into()], fs, vec![samples.clone(), samples])
                .unwrap();
        let matrix = coherence_matrix(&recording, &GAMMA_HIGH, 128).unwrap();
        assert!(matrix.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn flat_channel_yields_nan() {
        let samples: Vec<f64> = (0..512).map(|i| (i as f64 * 0.3).sin()).collect();
        let recording = Recording::new(
            vec!["A".into(), "B".into()],
            128.0,
            vec![samples, vec![1.0; 512]],
        )
        .unwrap();
        let matrix = coherence_matrix(&recording, &ALPHA, 128).unwrap();
        assert!(matrix.get(0, 1).unwrap().is_nan());
    }
}
