//! Persisted scaler + model bundle used at inference time.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::metrics::BinaryMetrics;
use super::registry::{ModelKind, TrainedModel};
use super::scaler::StandardScaler;
use super::{BINARY_CLASSES, ModelError};
use crate::dataset::FeatureMatrix;

const ARTIFACT_VERSION: i64 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub artifact_version: i64,
    /// Column order the model was trained on.
    pub feature_columns: Vec<String>,
    pub classes: Vec<String>,
    pub scaler: StandardScaler,
    pub model: TrainedModel,
    /// Held-out evaluation recorded at training time.
    #[serde(default)]
    pub metrics: Option<BinaryMetrics>,
}

impl ModelArtifact {
    pub fn new(
        feature_columns: Vec<String>,
        scaler: StandardScaler,
        model: TrainedModel,
    ) -> Result<Self, ModelError> {
        if model.n_features() != feature_columns.len() {
            return Err(ModelError::Invalid(format!(
                "model expects {} features but {} columns were given",
                model.n_features(),
                feature_columns.len()
            )));
        }
        Ok(Self {
            artifact_version: ARTIFACT_VERSION,
            feature_columns,
            classes: BINARY_CLASSES.iter().map(|c| c.to_string()).collect(),
            scaler,
            model,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: BinaryMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn kind(&self) -> ModelKind {
        self.model.kind()
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.artifact_version != ARTIFACT_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported artifact version {}",
                self.artifact_version
            )));
        }
        if self.model.n_features() != self.feature_columns.len() {
            return Err(ModelError::Invalid("feature column count mismatch".to_string()));
        }
        self.model.validate()
    }

    pub fn save_json(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ModelError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), model = %self.kind(), "Saved model artifact");
        Ok(())
    }

    pub fn load_json(path: &Path) -> Result<Self, ModelError> {
        let bytes = fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Self = serde_json::from_slice(&bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    /// `P(POST)` for unscaled rows; columns must match the trained order exactly.
    pub fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        if features.columns != self.feature_columns {
            return Err(ModelError::ColumnMismatch {
                expected: self.feature_columns.clone(),
                found: features.columns.clone(),
            });
        }
        let mut scaled = features.clone();
        self.scaler.transform(&mut scaled)?;
        Ok(self.model.predict_matrix(&scaled))
    }

    /// Class index (0 = PRE, 1 = POST) per row.
    pub fn predict(&self, features: &FeatureMatrix) -> Result<Vec<usize>, ModelError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| usize::from(p >= 0.5))
            .collect())
    }
}
