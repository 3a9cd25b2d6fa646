//! Model-ready datasets built from the feature store.

pub mod loader;
pub mod matrix;
pub mod split;

pub use loader::{CognitiveLoad, DatasetLoader, DatasetSplit, LabeledDataset, LoadOptions};
pub use matrix::FeatureMatrix;
pub use split::{SplitIndices, train_test_split};

use thiserror::Error;

use crate::ml::ModelError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("The query returned no data")]
    EmptyResult,
    #[error("Label column '{0}' not found in the dataset")]
    MissingLabelColumn(String),
    #[error("Row {row}: label '{value}' is outside the expected set (PRE, POST)")]
    UnknownLabel { row: usize, value: String },
    #[error("Row {row}: column '{column}' is not numeric")]
    NonNumericFeature { column: String, row: usize },
    #[error("test_size must be in (0, 1), got {0}")]
    InvalidTestSize(f64),
    #[error("Splitting {n_rows} rows at test_size {test_size} leaves an empty partition")]
    EmptyPartition { n_rows: usize, test_size: f64 },
}
