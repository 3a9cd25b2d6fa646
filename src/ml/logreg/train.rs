use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::LogRegModel;
use crate::ml::{ModelError, sigmoid, validate_training_set};

/// Training options for mini-batch SGD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub batch_size: usize,
    pub seed: u64,
    pub balance_classes: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.1,
            l2: 1e-4,
            batch_size: 64,
            seed: 42,
            balance_classes: false,
        }
    }
}

pub fn train_logreg(
    x: &[Vec<f64>],
    y: &[usize],
    options: &TrainOptions,
) -> Result<LogRegModel, ModelError> {
    let dim = validate_training_set(x, y)?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut weights: Vec<f64> = (0..dim).map(|_| (rng.random::<f64>() - 0.5) * 0.01).collect();
    let mut bias = 0.0f64;

    let mut indices: Vec<usize> = (0..x.len()).collect();
    let batch_size = options.batch_size.max(1);
    let lr = options.learning_rate;
    let l2 = options.l2.max(0.0);

    let class_weights = if options.balance_classes {
        let mut counts = [0f64; 2];
        for &label in y {
            counts[label] += 1.0;
        }
        let total = counts[0] + counts[1];
        counts.map(|count| if count == 0.0 { 0.0 } else { total / (2.0 * count) })
    } else {
        [1.0; 2]
    };

    for _epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        for chunk in indices.chunks(batch_size) {
            let mut grad_w = vec![0.0f64; dim];
            let mut grad_b = 0.0f64;
            let mut batch_weight = 0.0f64;
            for &idx in chunk {
                let weight = class_weights[y[idx]];
                if weight == 0.0 {
                    continue;
                }
                let row = &x[idx];
                let z = bias + weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>();
                let diff = sigmoid(z) - y[idx] as f64;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += diff * v * weight;
                }
                grad_b += diff * weight;
                batch_weight += weight;
            }
            if batch_weight == 0.0 {
                continue;
            }
            let inv = 1.0 / batch_weight;
            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * (g * inv + l2 * *w);
            }
            bias -= lr * grad_b * inv;
        }
    }

    let model = LogRegModel {
        model_version: 1,
        n_features: dim,
        weights,
        bias,
    };
    model.validate()?;
    Ok(model)
}
