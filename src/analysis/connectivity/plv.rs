use rayon::prelude::*;
use serde::Serialize;

use super::{BandSelection, ConnectivityParams, PairMatrix, channel_pairs};
use crate::analysis::AnalysisError;
use crate::analysis::filter::BandPassFilter;
use crate::analysis::fft::Complex64;
use crate::analysis::phase::{PhasePolicy, instantaneous_phase};
use crate::bands::Band;
use crate::recording::Recording;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlvFeatures {
    pub channel_1: String,
    pub channel_2: String,
    pub band: &'static str,
    pub plv: f64,
}

/// PLV for every channel pair after band-passing the recording to `band`.
pub fn plv_matrix(
    recording: &Recording,
    band: &Band,
    policy: PhasePolicy,
) -> Result<PairMatrix, AnalysisError> {
    let filter = BandPassFilter::design(band.low_hz, band.high_hz, recording.sample_rate())?;
    let phases: Vec<Vec<f64>> = recording
        .data()
        .par_iter()
        .map(|samples| instantaneous_phase(&filter.apply(samples), policy))
        .collect();
    let values = channel_pairs(recording.n_channels())
        .into_par_iter()
        .map(|(i, j)| phase_locking_value(&phases[i], &phases[j]))
        .collect();
    Ok(PairMatrix::from_pair_values(recording.n_channels(), values))
}

/// `|mean(exp(i·(a - b)))|`, NaN for empty input.
pub fn phase_locking_value(phase_a: &[f64], phase_b: &[f64]) -> f64 {
    let n = phase_a.len().min(phase_b.len());
    if n == 0 {
        return f64::NAN;
    }
    let sum: Complex64 = phase_a
        .iter()
        .zip(phase_b)
        .map(|(a, b)| Complex64::from_polar(1.0, a - b))
        .sum();
    sum.norm() / n as f64
}

/// One row per pair, band-major, over the first `max_channels` channels.
pub fn extract_plv_features(
    recording: &Recording,
    selection: BandSelection<'_>,
    params: &ConnectivityParams,
) -> Result<Vec<PlvFeatures>, AnalysisError> {
    let capped = recording.first_channels(params.max_channels);
    let names = capped.channel_names();
    let pairs = channel_pairs(capped.n_channels());
    let mut rows = Vec::with_capacity(pairs.len() * selection.bands().len());
    for band in selection.bands() {
        let matrix = plv_matrix(&capped, band, params.phase)?;
        for (&(i, j), &plv) in pairs.iter().zip(matrix.pair_values()) {
            rows.push(PlvFeatures {
                channel_1: names[i].clone(),
                channel_2: names[j].clone(),
                band: band.name,
                plv,
            });
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{ALPHA, CONNECTIVITY_BANDS};
    use std::f64::consts::PI;

    fn recording() -> Recording {
        let fs = 256.0;
        let n = 1024;
        let tone = |shift: f64| -> Vec<f64> {
            (0..n)
                .map(|i| (2.0 * PI * 10.0 * i as f64 / fs + shift).sin())
                .collect()
        };
        let wobble: Vec<f64> = (0..n)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 10.0 * t + 3.0 * (2.0 * PI * 0.7 * t).sin()).sin()
            })
            .collect();
        Recording::new(
            vec!["F3".into(), "F4".into(), "P3".into()],
            fs,
            vec![tone(0.0), tone(1.0), wobble],
        )
        .unwrap()
    }

    #[test]
    fn locked_tones_have_plv_near_one() {
        let matrix = plv_matrix(&recording(), &ALPHA, PhasePolicy::Analytic).unwrap();
        let locked = matrix.get(0, 1).unwrap();
        let drifting = matrix.get(0, 2).unwrap();
        assert!(locked > 0.95, "locked {locked}");
        assert!(drifting < locked);
    }

    #[test]
    fn matrix_is_symmetric_for_both_policies() {
        for policy in [PhasePolicy::Analytic, PhasePolicy::FftAngle] {
            let matrix = plv_matrix(&recording(), &ALPHA, policy).unwrap();
            for i in 0..3 {
                assert_eq!(matrix.get(i, i), None);
                for j in 0..3 {
                    if i != j {
                        assert_eq!(matrix.get(i, j), matrix.get(j, i));
                        let v = matrix.get(i, j).unwrap();
                        assert!((0.0..=1.0 + 1e-12).contains(&v));
                    }
                }
            }
        }
    }

    #[test]
    fn all_bands_mode_emits_every_pair_per_band() {
        let rows = extract_plv_features(
            &recording(),
            BandSelection::All(&CONNECTIVITY_BANDS),
            &ConnectivityParams::default(),
        )
        .unwrap();
        assert_eq!(rows.len(), 15);
        assert_eq!((rows[0].channel_1.as_str(), rows[0].channel_2.as_str()), ("F3", "F4"));
        assert_eq!(rows[0].band, "delta");
        assert_eq!(rows[14].band, "gamma");
    }

    #[test]
    fn identical_phases_lock_perfectly() {
        assert!((phase_locking_value(&[0.1, 0.5, 2.0], &[0.1, 0.5, 2.0]) - 1.0).abs() < 1e-12);
        assert!(phase_locking_value(&[], &[]).is_nan());
    }
}
