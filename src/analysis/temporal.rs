//! Amplitude-modulation and event-range features.

use serde::{Deserialize, Serialize};

use super::moments::{diff, mean, peak_to_peak};
use crate::recording::Recording;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub channel: String,
    /// Mean absolute sample-to-sample difference.
    pub amplitude_modulation: f64,
    /// `max - min` of the channel.
    pub event_related_dynamics: f64,
}

pub fn extract_temporal_features(recording: &Recording) -> Vec<TemporalFeatures> {
    recording
        .channels()
        .map(|channel| {
            let steps: Vec<f64> = diff(channel.samples).into_iter().map(f64::abs).collect();
            TemporalFeatures {
                channel: channel.name.to_string(),
                amplitude_modulation: mean(&steps),
                event_related_dynamics: peak_to_peak(channel.samples),
            }
        })
        .collect()
}
