//! Merging extractor output into per-session feature rows.
//!
//! Extractors emit small records keyed by channel, `(channel, band)` or
//! `(channel pair, band)`. [`merge::FeatureMerger`] unions records that share
//! a key, and [`rows`] turns merged rows into the flat structs persisted by
//! [`crate::store`].

pub mod merge;
pub mod records;
pub mod rows;

pub use merge::{FeatureMerger, MergedRow};
pub use records::{ChannelBandKey, FeatureRecord, PairBandKey};
pub use rows::{ConnectivityFeatureRow, StatisticalFeatureRow, TfrFeatureRow};

use serde::{Deserialize, Serialize};

/// Identifies the recording a set of rows was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionTag {
    pub session_id: i64,
    pub recording_filename: String,
}

impl SessionTag {
    pub fn new(session_id: i64, recording_filename: impl Into<String>) -> Self {
        Self {
            session_id,
            recording_filename: recording_filename.into(),
        }
    }
}
