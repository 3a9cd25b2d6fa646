//! Hjorth parameters and spectral entropy.

use serde::{Deserialize, Serialize};

use super::AnalysisError;
use super::moments::{diff, peak_to_peak, ratio_or_nan, variance};
use super::welch::{WelchParams, welch_psd};
use crate::recording::Recording;

/// Lower bound for normalized spectral probabilities.
const PROBABILITY_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HjorthFeatures {
    pub channel: String,
    pub spectral_entropy: f64,
    pub signal_variance: f64,
    pub hjorth_activity: f64,
    pub hjorth_mobility: f64,
    pub hjorth_complexity: f64,
    pub peak_to_peak_amplitude: f64,
}

/// Hjorth features for at most `max_channels` channels.
///
/// Spectral entropy uses the Welch PSD with `params`; constant channels
/// produce NaN mobility, complexity and spectral entropy.
pub fn extract_hjorth_features(
    recording: &Recording,
    params: &WelchParams,
    max_channels: usize,
) -> Result<Vec<HjorthFeatures>, AnalysisError> {
    let capped = recording.first_channels(max_channels);
    let spectrum = welch_psd(&capped, params)?;
    Ok(capped
        .channels()
        .map(|channel| {
            let psd = spectrum.channel(channel.index).unwrap_or(&[]);
            let (activity, mobility, complexity) = hjorth_parameters(channel.samples);
            HjorthFeatures {
                channel: channel.name.to_string(),
                spectral_entropy: spectral_entropy(psd),
                signal_variance: activity,
                hjorth_activity: activity,
                hjorth_mobility: mobility,
                hjorth_complexity: complexity,
                peak_to_peak_amplitude: peak_to_peak(channel.samples),
            }
        })
        .collect())
}

/// `(activity, mobility, complexity)` of one channel.
pub fn hjorth_parameters(samples: &[f64]) -> (f64, f64, f64) {
    let first = diff(samples);
    let second = diff(&first);
    let activity = variance(samples);
    let var_first = variance(&first);
    let var_second = variance(&second);
    let mobility = ratio_or_nan(var_first, activity).sqrt();
    let complexity = ratio_or_nan(var_second, var_first).sqrt();
    (activity, mobility, complexity)
}

/// Entropy of the PSD treated as a probability distribution.
///
/// The PSD is normalized first and the probabilities are floored, so the
/// result does not depend on signal units. A spectrum with no power is NaN.
pub fn spectral_entropy(psd: &[f64]) -> f64 {
    let total: f64 = psd.iter().sum();
    if total <= 0.0 || !total.is_finite() {
        return f64::NAN;
    }
    psd.iter()
        .map(|power| (power / total).max(PROBABILITY_FLOOR))
        .map(|p| -p * p.ln())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn constant_channel_does_not_panic() {
        let recording = Recording::new(vec!["Cz".into()], 128.0, vec![vec![3.0; 512]]).unwrap();
        let feats = extract_hjorth_features(&recording, &WelchParams::default(), 64).unwrap();
        assert_eq!(feats[0].hjorth_activity, 0.0);
        assert!(feats[0].hjorth_mobility.is_nan());
        assert!(feats[0].hjorth_complexity.is_nan());
        assert!(feats[0].spectral_entropy.is_nan());
    }

    #[test]
    fn zero_channel_matches_constant_policy() {
        let (activity, mobility, complexity) = hjorth_parameters(&[0.0; 64]);
        assert_eq!(activity, 0.0);
        assert!(mobility.is_nan() && complexity.is_nan());
    }

    #[test]
    fn mobility_tracks_frequency() {
        let fs = 256.0;
        let slow: Vec<f64> = (0..1024).map(|i| (2.0 * PI * 4.0 * i as f64 / fs).sin()).collect();
        let fast: Vec<f64> = (0..1024).map(|i| (2.0 * PI * 32.0 * i as f64 / fs).sin()).collect();
        let (_, slow_mobility, slow_complexity) = hjorth_parameters(&slow);
        let (_, fast_mobility, _) = hjorth_parameters(&fast);
        assert!(fast_mobility > slow_mobility);
        // a pure tone has complexity close to 1
        assert!((slow_complexity - 1.0).abs() < 0.05);
    }

    #[test]
    fn flat_spectrum_has_maximal_entropy() {
        let flat = spectral_entropy(&[1.0; 16]);
        assert!((flat - 16.0_f64.ln()).abs() < 1e-12);
        assert!(spectral_entropy(&[1.0, 0.0, 0.0, 0.0]) < flat);
    }

    #[test]
    fn entropy_does_not_depend_on_signal_units() {
        let fs = 256.0;
        let tone: Vec<f64> = (0..1024)
            .map(|i| {
                let t = i as f64 / fs;
                (2.0 * PI * 10.0 * t).sin() + 0.5 * (2.0 * PI * 37.0 * t).sin()
            })
            .collect();
        let microvolts: Vec<f64> = tone.iter().map(|v| v * 10.0).collect();
        let volts: Vec<f64> = tone.iter().map(|v| v * 10e-6).collect();
        let recording =
            Recording::new(vec!["uV".into(), "V".into()], fs, vec![microvolts, volts]).unwrap();
        let feats = extract_hjorth_features(&recording, &WelchParams::default(), 64).unwrap();
        let (a, b) = (feats[0].spectral_entropy, feats[1].spectral_entropy);
        assert!(a.is_finite());
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }

    #[test]
    fn tiny_psd_values_keep_their_shape() {
        let peaked = spectral_entropy(&[1e-14, 1e-18, 1e-18, 1e-18]);
        assert!((peaked - spectral_entropy(&[1.0, 1e-4, 1e-4, 1e-4])).abs() < 1e-9);
        assert!(peaked < 4.0_f64.ln() / 2.0);
        assert!(spectral_entropy(&[0.0; 8]).is_nan());
    }

    #[test]
    fn respects_channel_cap() {
        let recording = Recording::new(
            vec!["A".into(), "B".into(), "C".into()],
            128.0,
            vec![vec![1.0, 2.0, 3.0, 1.0]; 3],
        )
        .unwrap();
        let feats = extract_hjorth_features(&recording, &WelchParams::default(), 2).unwrap();
        assert_eq!(feats.len(), 2);
        assert!((feats[0].peak_to_peak_amplitude - 2.0).abs() < 1e-12);
    }
}
