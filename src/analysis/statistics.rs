//! Per-channel time-domain statistics.

use serde::{Deserialize, Serialize};

use super::moments::{
    central_moment, mean, min_max, peak_to_peak, ratio_or_nan, shannon_entropy, variance,
};
use crate::recording::Recording;

/// Tunables for [`extract_statistical_features`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticalParams {
    /// Number of amplitude-histogram bins used for Shannon entropy.
    pub entropy_bins: usize,
    /// Spikes are samples with `|x| > multiplier * std`.
    pub spike_threshold_multiplier: f64,
}

impl Default for StatisticalParams {
    fn default() -> Self {
        Self {
            entropy_bins: 100,
            spike_threshold_multiplier: 5.0,
        }
    }
}

/// Time-domain statistics for one channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    pub channel: String,
    pub shannon_entropy: f64,
    pub mean: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub peak_to_peak: f64,
    pub zero_crossing_rate: f64,
    pub kurtosis: f64,
    pub skewness: f64,
    /// `mean(x²) / var(x - mean)`, NaN for a constant channel.
    pub snr: f64,
    pub spike_count: u32,
}

/// Compute [`StatisticalFeatures`] for every channel, in recording order.
pub fn extract_statistical_features(
    recording: &Recording,
    params: &StatisticalParams,
) -> Vec<StatisticalFeatures> {
    recording
        .channels()
        .map(|channel| channel_statistics(channel.name, channel.samples, params))
        .collect()
}

/// Statistics for a single channel vector.
pub fn channel_statistics(
    name: &str,
    samples: &[f64],
    params: &StatisticalParams,
) -> StatisticalFeatures {
    let mean_val = mean(samples);
    let variance_val = variance(samples);
    let std_dev = variance_val.sqrt();
    let m3 = central_moment(samples, 3);
    let m4 = central_moment(samples, 4);
    let signal_power = mean(&samples.iter().map(|v| v * v).collect::<Vec<_>>());
    let centered: Vec<f64> = samples.iter().map(|v| v - mean_val).collect();
    let noise_power = variance(&centered);
    let spike_threshold = params.spike_threshold_multiplier * std_dev;

    StatisticalFeatures {
        channel: name.to_string(),
        shannon_entropy: histogram_entropy(samples, params.entropy_bins),
        mean: mean_val,
        variance: variance_val,
        standard_deviation: std_dev,
        peak_to_peak: peak_to_peak(samples),
        zero_crossing_rate: zero_crossing_rate(samples),
        kurtosis: ratio_or_nan(m4, variance_val * variance_val) - 3.0,
        skewness: ratio_or_nan(m3, variance_val.powf(1.5)),
        snr: ratio_or_nan(signal_power, noise_power),
        spike_count: samples.iter().filter(|v| v.abs() > spike_threshold).count() as u32,
    }
}

/// Sign changes between consecutive samples divided by the sample count.
///
/// Exact zeros have their own sign, so `1, 0, -1` counts two changes.
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return f64::NAN;
    }
    let changes = samples
        .windows(2)
        .filter(|w| sign(w[0]) != sign(w[1]))
        .count();
    changes as f64 / samples.len() as f64
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Entropy of an equal-width amplitude histogram spanning `[min, max]`.
pub fn histogram_entropy(samples: &[f64], bins: usize) -> f64 {
    shannon_entropy(&histogram_counts(samples, bins.max(1)))
}

fn histogram_counts(samples: &[f64], bins: usize) -> Vec<f64> {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    let mut counts = vec![0.0_f64; bins];
    if finite.is_empty() {
        return counts;
    }
    let (mut lo, mut hi) = min_max(&finite);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let span = hi - lo;
    for v in finite {
        let idx = (((v - lo) / span) * bins as f64) as usize;
        counts[idx.min(bins - 1)] += 1.0;
    }
    counts
}
