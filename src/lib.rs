//! EEG feature extraction, feature storage and baseline cognitive-load models.
//!
//! Recordings flow through the extractors in [`analysis`], are merged into
//! per-session rows by [`features`], persisted in SQLite by [`store`], loaded
//! back as standardized matrices by [`dataset`] and fed to the models in [`ml`].
//! [`pipeline`] ties extraction together for batches of recordings.

pub mod analysis;
pub mod app_dirs;
pub mod bands;
pub mod config;
pub mod dataset;
pub mod features;
pub mod logging;
pub mod ml;
pub mod pipeline;
pub mod recording;
pub mod store;
