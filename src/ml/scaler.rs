//! Column-wise standardization that can be persisted and reapplied.

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::dataset::FeatureMatrix;

/// Per-column `(x - mean) / std` fitted on a named subset of columns.
///
/// Non-finite cells are ignored while fitting and pass through unchanged.
/// Columns with zero variance keep a scale of 1 so they map to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fit on every column of `candidates` that `matrix` has; the rest are skipped.
    pub fn fit(matrix: &FeatureMatrix, candidates: &[&str]) -> Self {
        let mut columns = Vec::new();
        let mut mean = Vec::new();
        let mut scale = Vec::new();
        for name in candidates {
            let Some(column) = matrix.column(name) else {
                continue;
            };
            let finite: Vec<f64> = column.iter().copied().filter(|v| v.is_finite()).collect();
            let (m, s) = if finite.is_empty() {
                (0.0, 1.0)
            } else {
                let n = finite.len() as f64;
                let m = finite.iter().sum::<f64>() / n;
                let var = finite.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
                let s = var.sqrt();
                (m, if s > 0.0 { s } else { 1.0 })
            };
            columns.push((*name).to_string());
            mean.push(m);
            scale.push(s);
        }
        Self {
            columns,
            mean,
            scale,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Standardize the fitted columns of `matrix` in place.
    pub fn transform(&self, matrix: &mut FeatureMatrix) -> Result<(), ModelError> {
        for ((name, m), s) in self.columns.iter().zip(&self.mean).zip(&self.scale) {
            let idx = matrix
                .column_index(name)
                .ok_or_else(|| ModelError::MissingColumn(name.clone()))?;
            matrix
                .values
                .column_mut(idx)
                .mapv_inplace(|v| (v - m) / s);
        }
        Ok(())
    }
}
