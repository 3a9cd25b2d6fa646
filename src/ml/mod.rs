//! Machine learning helpers for training and inference on session features.
//!
//! These are baseline binary classifiers (PRE vs POST) that train directly on
//! [`crate::dataset::FeatureMatrix`] rows and serialize to JSON.

pub mod artifact;
pub mod gbdt_stump;
pub mod logreg;
pub mod metrics;
pub mod registry;
pub mod scaler;

use std::path::PathBuf;

use thiserror::Error;

use crate::dataset::FeatureMatrix;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Unsupported model '{0}'")]
    UnsupportedModel(String),
    #[error("Feature column '{0}' is missing")]
    MissingColumn(String),
    #[error(
        "Feature columns do not match the trained model (expected {expected:?}, got {found:?})"
    )]
    ColumnMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("Empty training set")]
    EmptyTrainingSet,
    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Label {0} is not a binary class index")]
    InvalidLabel(usize),
    #[error("Invalid model: {0}")]
    Invalid(String),
    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Model JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Class names in index order.
pub const BINARY_CLASSES: [&str; 2] = ["PRE", "POST"];

/// Logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Dense rows with non-finite cells imputed as 0 (the standardized mean).
pub(crate) fn dense_rows(matrix: &FeatureMatrix) -> Vec<Vec<f64>> {
    matrix
        .values
        .outer_iter()
        .map(|row| {
            row.iter()
                .map(|v| if v.is_finite() { *v } else { 0.0 })
                .collect()
        })
        .collect()
}

/// Shared input checks for the binary trainers.
pub(crate) fn validate_training_set(x: &[Vec<f64>], y: &[usize]) -> Result<usize, ModelError> {
    if x.is_empty() {
        return Err(ModelError::EmptyTrainingSet);
    }
    if x.len() != y.len() {
        return Err(ModelError::LengthMismatch {
            rows: x.len(),
            labels: y.len(),
        });
    }
    if let Some(&bad) = y.iter().find(|&&label| label > 1) {
        return Err(ModelError::InvalidLabel(bad));
    }
    let dim = x[0].len();
    if x.iter().any(|row| row.len() != dim) {
        return Err(ModelError::Invalid("Inconsistent feature row length".to_string()));
    }
    Ok(dim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
    }

    #[test]
    fn dense_rows_impute_nan() {
        let m = FeatureMatrix::new(vec!["a".into(), "b".into()], array![[1.0, f64::NAN]]);
        assert_eq!(dense_rows(&m), vec![vec![1.0, 0.0]]);
    }

    #[test]
    fn training_set_checks() {
        assert!(matches!(validate_training_set(&[], &[]), Err(ModelError::EmptyTrainingSet)));
        assert!(matches!(
            validate_training_set(&[vec![1.0]], &[2]),
            Err(ModelError::InvalidLabel(2))
        ));
        assert_eq!(validate_training_set(&[vec![1.0, 2.0]], &[1]).unwrap(), 2);
    }
}
