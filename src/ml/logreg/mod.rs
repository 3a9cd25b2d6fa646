//! Binary logistic regression over standardized session features.

use serde::{Deserialize, Serialize};

use super::{ModelError, sigmoid};

mod train;
pub use train::{TrainOptions, train_logreg};

/// Versioned logistic regression model; `predict_proba` is `P(POST)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRegModel {
    pub model_version: i64,
    pub n_features: usize,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogRegModel {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.weights.len() != self.n_features {
            return Err(ModelError::Invalid("weights length mismatch".to_string()));
        }
        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(ModelError::Invalid("non-finite coefficients".to_string()));
        }
        Ok(())
    }

    pub fn decision(&self, features: &[f64]) -> f64 {
        self.bias
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.decision(features))
    }

    pub fn predict_class_index(&self, features: &[f64]) -> usize {
        usize::from(self.predict_proba(features) >= 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_model_is_undecided() {
        let model = LogRegModel {
            model_version: 1,
            n_features: 2,
            weights: vec![0.0, 0.0],
            bias: 0.0,
        };
        model.validate().unwrap();
        assert!((model.predict_proba(&[3.0, -1.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_shape_mismatch() {
        let model = LogRegModel {
            model_version: 1,
            n_features: 3,
            weights: vec![0.0],
            bias: 0.0,
        };
        assert!(model.validate().is_err());
    }
}
