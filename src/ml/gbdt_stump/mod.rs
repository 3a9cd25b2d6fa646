//! Deterministic gradient-boosted decision-stump classifier.
//!
//! Binary logistic boosting: each round fits one stump to the residuals
//! `y - sigmoid(raw)` over binned feature values.

mod model;
mod train;

pub use model::{GbdtStumpModel, Stump};
pub use train::{TrainOptions, train_gbdt_stump};
