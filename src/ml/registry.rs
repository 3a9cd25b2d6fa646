//! Closed set of trainable models and the dispatch from name to trainer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::gbdt_stump::{self, GbdtStumpModel};
use super::logreg::{self, LogRegModel};
use super::{ModelError, dense_rows};
use crate::dataset::FeatureMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::LogisticRegression, ModelKind::GradientBoosting];

    pub fn name(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }

    /// Train this model on standardized rows; NaN cells are imputed as 0.
    pub fn train(
        self,
        x: &FeatureMatrix,
        y: &[usize],
        options: &ModelOptions,
    ) -> Result<TrainedModel, ModelError> {
        let rows = dense_rows(x);
        info!(model = self.name(), rows = rows.len(), features = x.n_cols(), "Training model");
        match self {
            ModelKind::LogisticRegression => {
                logreg::train_logreg(&rows, y, &options.logistic_regression)
                    .map(TrainedModel::LogisticRegression)
            }
            ModelKind::GradientBoosting => {
                gbdt_stump::train_gbdt_stump(&rows, y, &options.gradient_boosting)
                    .map(TrainedModel::GradientBoosting)
            }
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "logistic_regression" | "logreg" => Ok(ModelKind::LogisticRegression),
            "gradient_boosting" | "gbdt" | "gbdt_stump" => Ok(ModelKind::GradientBoosting),
            _ => Err(ModelError::UnsupportedModel(value.to_string())),
        }
    }
}

/// Hyperparameters for every model kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub logistic_regression: logreg::TrainOptions,
    pub gradient_boosting: gbdt_stump::TrainOptions,
}

/// A fitted model of any supported kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrainedModel {
    LogisticRegression(LogRegModel),
    GradientBoosting(GbdtStumpModel),
}

impl TrainedModel {
    pub fn kind(&self) -> ModelKind {
        match self {
            TrainedModel::LogisticRegression(_) => ModelKind::LogisticRegression,
            TrainedModel::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            TrainedModel::LogisticRegression(model) => model.n_features,
            TrainedModel::GradientBoosting(model) => model.n_features,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        match self {
            TrainedModel::LogisticRegression(model) => model.validate(),
            TrainedModel::GradientBoosting(model) => model.validate(),
        }
    }

    /// `P(POST)` for one dense feature row.
    pub fn predict_proba(&self, features: &[f64]) -> f64 {
        match self {
            TrainedModel::LogisticRegression(model) => model.predict_proba(features),
            TrainedModel::GradientBoosting(model) => model.predict_proba(features),
        }
    }

    /// `P(POST)` per matrix row, with NaN cells imputed as 0.
    pub fn predict_matrix(&self, x: &FeatureMatrix) -> Vec<f64> {
        dense_rows(x).iter().map(|row| self.predict_proba(row)).collect()
    }
}
