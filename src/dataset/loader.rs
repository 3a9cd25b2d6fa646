//! Turns the joined feature tables into labeled, standardized train/test matrices.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::DatasetError;
use super::matrix::FeatureMatrix;
use super::split::train_test_split;
use crate::ml::scaler::StandardScaler;
use crate::store::{CellValue, FeatureStore, JoinedTable};

/// Columns standardized before splitting, when present.
pub const FEATURES_TO_NORMALIZE: [&str; 11] = [
    "amplitude_modulation",
    "event_related_dynamics",
    "signal_variance",
    "hjorth_activity",
    "hjorth_mobility",
    "hjorth_complexity",
    "peak_to_peak_amplitude",
    "zero_crossing_rate",
    "power_tfr_morlet",
    "power_psd_welch",
    "band_power",
];

/// Identifier columns never used as model features.
pub const IDENTIFIER_COLUMNS: [&str; 4] = ["recording_filename", "channel", "band", "session_id"];

/// Closed label set of the cognitive-load task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CognitiveLoad {
    Pre,
    Post,
}

impl CognitiveLoad {
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "PRE" => Some(CognitiveLoad::Pre),
            "POST" => Some(CognitiveLoad::Post),
            _ => None,
        }
    }

    pub fn class_index(self) -> usize {
        match self {
            CognitiveLoad::Pre => 0,
            CognitiveLoad::Post => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CognitiveLoad::Pre => "PRE",
            CognitiveLoad::Post => "POST",
        }
    }
}

/// Options recognized by [`DatasetLoader::load_features`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub label_column: String,
    pub test_size: f64,
    pub random_state: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            label_column: "cognitive_load_status".to_string(),
            test_size: 0.2,
            random_state: 42,
        }
    }
}

/// Feature matrix with one encoded label per row, before splitting.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    pub features: FeatureMatrix,
    pub labels: Vec<usize>,
    pub scaler: StandardScaler,
}

/// Row-aligned train/test partitions plus the scaler fitted on all rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSplit {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
    pub scaler: StandardScaler,
}

/// Reads model-ready data from a [`FeatureStore`].
pub struct DatasetLoader<'a> {
    store: &'a FeatureStore,
}

impl<'a> DatasetLoader<'a> {
    pub fn new(store: &'a FeatureStore) -> Self {
        Self { store }
    }

    pub fn load_features(&self, options: &LoadOptions) -> Result<DatasetSplit, DatasetError> {
        let table = self.store.joined_features(&options.label_column)?;
        info!(
            rows = table.rows.len(),
            columns = table.columns.len(),
            "Loaded joined feature table"
        );
        split_dataset(prepare_labeled(&table, &options.label_column)?, options)
    }
}

/// Validate labels, drop identifiers and standardize, keeping row order.
pub fn prepare_labeled(
    table: &JoinedTable,
    label_column: &str,
) -> Result<LabeledDataset, DatasetError> {
    if table.is_empty() {
        return Err(DatasetError::EmptyResult);
    }
    let label_idx = table
        .column_index(label_column)
        .ok_or_else(|| DatasetError::MissingLabelColumn(label_column.to_string()))?;
    let labels = encode_labels(table, label_idx)?;

    let feature_idx: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(idx, name)| *idx != label_idx && !IDENTIFIER_COLUMNS.contains(&name.as_str()))
        .map(|(idx, _)| idx)
        .collect();
    let columns: Vec<String> = feature_idx.iter().map(|&idx| table.columns[idx].clone()).collect();
    let mut values = Array2::<f64>::zeros((table.rows.len(), feature_idx.len()));
    for (r, row) in table.rows.iter().enumerate() {
        for (c, &idx) in feature_idx.iter().enumerate() {
            values[[r, c]] = numeric_cell(&row[idx]).ok_or_else(|| DatasetError::NonNumericFeature {
                column: table.columns[idx].clone(),
                row: r,
            })?;
        }
    }
    let mut features = FeatureMatrix::new(columns, values);

    let scaler = StandardScaler::fit(&features, &FEATURES_TO_NORMALIZE);
    if scaler.is_empty() {
        debug!("No columns selected for normalization");
    }
    scaler.transform(&mut features)?;
    Ok(LabeledDataset {
        features,
        labels,
        scaler,
    })
}

/// Seeded train/test partition of a labeled dataset.
pub fn split_dataset(
    dataset: LabeledDataset,
    options: &LoadOptions,
) -> Result<DatasetSplit, DatasetError> {
    let indices = train_test_split(dataset.labels.len(), options.test_size, options.random_state)?;
    let pick = |rows: &[usize]| rows.iter().map(|&idx| dataset.labels[idx]).collect::<Vec<_>>();
    let split = DatasetSplit {
        x_train: dataset.features.select_rows(&indices.train),
        x_test: dataset.features.select_rows(&indices.test),
        y_train: pick(&indices.train),
        y_test: pick(&indices.test),
        scaler: dataset.scaler,
    };
    info!(
        train = split.y_train.len(),
        test = split.y_test.len(),
        features = split.x_train.n_cols(),
        "Split dataset"
    );
    Ok(split)
}

fn encode_labels(table: &JoinedTable, label_idx: usize) -> Result<Vec<usize>, DatasetError> {
    table
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            let cell = &cells[label_idx];
            cell.as_text()
                .and_then(CognitiveLoad::from_label)
                .map(CognitiveLoad::class_index)
                .ok_or_else(|| DatasetError::UnknownLabel {
                    row,
                    value: describe_cell(cell),
                })
        })
        .collect()
}

fn numeric_cell(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Null => Some(f64::NAN),
        CellValue::Integer(v) => Some(*v as f64),
        CellValue::Real(v) => Some(*v),
        CellValue::Text(_) => None,
    }
}

fn describe_cell(cell: &CellValue) -> String {
    match cell {
        CellValue::Null => "NULL".to_string(),
        CellValue::Integer(v) => v.to_string(),
        CellValue::Real(v) => v.to_string(),
        CellValue::Text(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(labels: &[&str]) -> JoinedTable {
        JoinedTable {
            columns: vec![
                "session_id".into(),
                "channel".into(),
                "band_power".into(),
                "kurtosis".into(),
                "cognitive_load_status".into(),
            ],
            rows: labels
                .iter()
                .enumerate()
                .map(|(i, label)| {
                    vec![
                        CellValue::Integer(1),
                        CellValue::Text("Cz".into()),
                        CellValue::Real(i as f64),
                        CellValue::Real(10.0 + i as f64),
                        CellValue::Text((*label).into()),
                    ]
                })
                .collect(),
        }
    }

    #[test]
    fn labels_follow_row_order() {
        let dataset =
            prepare_labeled(&table(&["PRE", "PRE", "POST"]), "cognitive_load_status").unwrap();
        assert_eq!(dataset.labels, vec![0, 0, 1]);
        assert_eq!(
            dataset.features.columns,
            vec!["band_power".to_string(), "kurtosis".to_string()]
        );
        // kurtosis is not in the normalized subset
        assert_eq!(dataset.features.values[[2, 1]], 12.0);
        assert_eq!(dataset.scaler.columns, vec!["band_power".to_string()]);
    }

    #[test]
    fn unknown_label_fails_the_whole_load() {
        let err = prepare_labeled(&table(&["PRE", "UNKNOWN", "POST"]), "cognitive_load_status")
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::UnknownLabel { row: 1, ref value } if value == "UNKNOWN"
        ));
    }

    #[test]
    fn missing_label_column_and_empty_result_fail() {
        assert!(matches!(
            prepare_labeled(&table(&["PRE"]), "eyes_state"),
            Err(DatasetError::MissingLabelColumn(_))
        ));
        assert!(matches!(
            prepare_labeled(&table(&[]), "cognitive_load_status"),
            Err(DatasetError::EmptyResult)
        ));
    }

    #[test]
    fn null_label_is_rejected() {
        let mut t = table(&["PRE", "POST"]);
        t.rows[0][4] = CellValue::Null;
        assert!(matches!(
            prepare_labeled(&t, "cognitive_load_status"),
            Err(DatasetError::UnknownLabel { row: 0, .. })
        ));
    }

    #[test]
    fn split_keeps_features_and_labels_aligned() {
        let labels: Vec<&str> = (0..10).map(|i| if i % 2 == 0 { "PRE" } else { "POST" }).collect();
        let dataset = prepare_labeled(&table(&labels), "cognitive_load_status").unwrap();
        let split = split_dataset(dataset, &LoadOptions::default()).unwrap();
        assert_eq!(split.y_test.len(), 2);
        assert_eq!(split.x_train.n_rows() + split.x_test.n_rows(), 10);
        for (row, label) in split.x_train.values.outer_iter().zip(&split.y_train) {
            // kurtosis column still holds 10 + original index
            let original = (row[1] - 10.0).round() as usize;
            assert_eq!(*label, original % 2);
        }
    }
}
