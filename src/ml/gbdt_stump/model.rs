use serde::{Deserialize, Serialize};

use crate::ml::{ModelError, sigmoid};

/// Single-node decision tree used as a weak learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stump {
    pub feature_index: usize,
    /// Threshold in (standardized) feature units.
    pub threshold: f64,
    /// Prediction for `feature <= threshold`.
    pub left_value: f64,
    pub right_value: f64,
}

impl Stump {
    pub fn predict(&self, features: &[f64]) -> f64 {
        let value = features.get(self.feature_index).copied().unwrap_or(0.0);
        if value <= self.threshold {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Boosted stumps producing a raw log-odds score for the POST class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtStumpModel {
    pub model_version: i64,
    pub n_features: usize,
    pub learning_rate: f64,
    /// Log-odds of the training prior.
    pub init_raw: f64,
    /// One stump per boosting round.
    pub stumps: Vec<Stump>,
}

impl GbdtStumpModel {
    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.init_raw.is_finite() || !self.learning_rate.is_finite() {
            return Err(ModelError::Invalid("non-finite boosting parameters".to_string()));
        }
        if let Some((round, stump)) = self
            .stumps
            .iter()
            .enumerate()
            .find(|(_, stump)| stump.feature_index >= self.n_features)
        {
            return Err(ModelError::Invalid(format!(
                "Round {round} splits on feature {} but the model has {}",
                stump.feature_index, self.n_features
            )));
        }
        Ok(())
    }

    pub fn predict_raw(&self, features: &[f64]) -> f64 {
        self.init_raw
            + self
                .stumps
                .iter()
                .map(|stump| self.learning_rate * stump.predict(features))
                .sum::<f64>()
    }

    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        sigmoid(self.predict_raw(features))
    }

    pub fn predict_class_index(&self, features: &[f64]) -> usize {
        usize::from(self.predict_raw(features) >= 0.0)
    }
}
