use serde::{Deserialize, Serialize};

use super::model::{GbdtStumpModel, Stump};
use crate::ml::{ModelError, sigmoid, validate_training_set};

/// Training hyperparameters for stump boosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub rounds: usize,
    pub learning_rate: f64,
    /// Number of bins used for split search.
    pub bins: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            rounds: 100,
            learning_rate: 0.1,
            bins: 32,
        }
    }
}

/// Train a binary stump-GBDT model with logistic loss.
pub fn train_gbdt_stump(
    x: &[Vec<f64>],
    y: &[usize],
    options: &TrainOptions,
) -> Result<GbdtStumpModel, ModelError> {
    let d = validate_training_set(x, y)?;
    if d == 0 {
        return Err(ModelError::Invalid("No feature columns".to_string()));
    }
    let bins = options.bins.clamp(2, 256);
    let (mins, maxs) = compute_feature_min_max(x, d);
    let binned = bin_features(x, &mins, &maxs, bins);

    let init_raw = prior_log_odds(y);
    let mut raw = vec![init_raw; x.len()];
    let mut stumps = Vec::with_capacity(options.rounds);
    for _round in 0..options.rounds {
        let residuals: Vec<f64> = y
            .iter()
            .zip(&raw)
            .map(|(&label, &r)| label as f64 - sigmoid(r))
            .collect();
        let stump = fit_best_stump(&binned, x, &mins, &maxs, bins, &residuals);
        for (r, row) in raw.iter_mut().zip(x) {
            *r += options.learning_rate * stump.predict(row);
        }
        stumps.push(stump);
    }

    let model = GbdtStumpModel {
        model_version: 1,
        n_features: d,
        learning_rate: options.learning_rate,
        init_raw,
        stumps,
    };
    model.validate()?;
    Ok(model)
}

fn prior_log_odds(y: &[usize]) -> f64 {
    let positive = y.iter().filter(|&&label| label == 1).count() as f64;
    let p = (positive / y.len().max(1) as f64).clamp(1e-6, 1.0 - 1e-6);
    (p / (1.0 - p)).ln()
}

fn compute_feature_min_max(x: &[Vec<f64>], feature_len: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mins = vec![f64::INFINITY; feature_len];
    let mut maxs = vec![f64::NEG_INFINITY; feature_len];
    for row in x {
        for (j, &v) in row.iter().take(feature_len).enumerate() {
            if v.is_finite() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
    }
    for j in 0..feature_len {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f64>], mins: &[f64], maxs: &[f64], bins: usize) -> Vec<Vec<u8>> {
    let top = (bins - 1) as f64;
    x.iter()
        .map(|row| {
            mins.iter()
                .zip(maxs)
                .enumerate()
                .map(|(j, (&min, &max))| {
                    let v = row.get(j).copied().unwrap_or(0.0);
                    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
                    (t * top).round() as u8
                })
                .collect()
        })
        .collect()
}

fn fit_best_stump(
    binned: &[Vec<u8>],
    x: &[Vec<f64>],
    mins: &[f64],
    maxs: &[f64],
    bins: usize,
    residuals: &[f64],
) -> Stump {
    let mut best = BestSplit::default();
    for feature_idx in 0..mins.len() {
        let split = best_split_for_feature(binned, residuals, feature_idx, bins);
        if split.score < best.score {
            best = split;
        }
    }
    let feature_idx = best.feature_index;
    let threshold = threshold_for_bin(mins[feature_idx], maxs[feature_idx], best.split_bin, bins);
    let (left_value, right_value) = leaf_means_for_threshold(x, residuals, feature_idx, threshold);
    Stump {
        feature_index: feature_idx,
        threshold,
        left_value,
        right_value,
    }
}

#[derive(Debug, Clone)]
struct BestSplit {
    score: f64,
    feature_index: usize,
    split_bin: usize,
}

impl Default for BestSplit {
    fn default() -> Self {
        Self {
            score: f64::INFINITY,
            feature_index: 0,
            split_bin: 0,
        }
    }
}

/// Lowest summed squared error over split points of one feature's histogram.
fn best_split_for_feature(
    binned: &[Vec<u8>],
    residuals: &[f64],
    feature_idx: usize,
    bins: usize,
) -> BestSplit {
    let mut counts = vec![0u32; bins];
    let mut sums = vec![0f64; bins];
    let mut sums_sq = vec![0f64; bins];
    for (row, &r) in binned.iter().zip(residuals) {
        let b = row.get(feature_idx).copied().unwrap_or(0) as usize;
        counts[b] += 1;
        sums[b] += r;
        sums_sq[b] += r * r;
    }
    let total_count: u32 = counts.iter().sum();
    let total_sum: f64 = sums.iter().sum();
    let total_sum_sq: f64 = sums_sq.iter().sum();

    let mut best = BestSplit {
        feature_index: feature_idx,
        ..BestSplit::default()
    };
    let mut left_count = 0u32;
    let mut left_sum = 0f64;
    let mut left_sum_sq = 0f64;
    for split_bin in 0..(bins - 1) {
        left_count += counts[split_bin];
        left_sum += sums[split_bin];
        left_sum_sq += sums_sq[split_bin];
        let right_count = total_count - left_count;
        if left_count == 0 || right_count == 0 {
            continue;
        }
        let right_sum = total_sum - left_sum;
        let right_sum_sq = total_sum_sq - left_sum_sq;
        let left_sse = left_sum_sq - (left_sum * left_sum) / left_count as f64;
        let right_sse = right_sum_sq - (right_sum * right_sum) / right_count as f64;
        let score = left_sse + right_sse;
        if score < best.score {
            best.score = score;
            best.split_bin = split_bin;
        }
    }
    best
}

fn threshold_for_bin(min: f64, max: f64, split_bin: usize, bins: usize) -> f64 {
    // bin b covers values rounding to b, so its upper edge sits half a step above
    let step = (max - min) / (bins - 1) as f64;
    min + (split_bin as f64 + 0.5) * step
}

fn leaf_means_for_threshold(
    x: &[Vec<f64>],
    residuals: &[f64],
    feature_idx: usize,
    threshold: f64,
) -> (f64, f64) {
    let mut left = (0.0f64, 0u32);
    let mut right = (0.0f64, 0u32);
    for (row, &r) in x.iter().zip(residuals) {
        let v = row.get(feature_idx).copied().unwrap_or(0.0);
        let side = if v <= threshold { &mut left } else { &mut right };
        side.0 += r;
        side.1 += 1;
    }
    let mean = |(sum, count): (f64, u32)| if count == 0 { 0.0 } else { sum / count as f64 };
    (mean(left), mean(right))
}
