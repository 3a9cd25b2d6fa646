//! Flat, persisted row types assembled from merged feature records.
//!
//! Missing fields default to `0.0`, except the fields whose extractor uses
//! NaN to mark "no estimate" (`snr`, the PSD and Morlet band powers and
//! `coherence`), which default to NaN so an absent source is not mistaken
//! for a measured zero.

use serde::{Deserialize, Serialize};

use super::merge::MergedRow;
use super::records::{ChannelBandKey, PairBandKey};

/// One channel's time-domain and Hjorth features (`statistical_features`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatureRow {
    pub session_id: i64,
    pub recording_filename: String,
    pub channel: String,
    pub amplitude_modulation: f64,
    pub event_related_dynamics: f64,
    pub spectral_entropy: f64,
    pub signal_variance: f64,
    pub hjorth_activity: f64,
    pub hjorth_mobility: f64,
    pub hjorth_complexity: f64,
    pub peak_to_peak_amplitude: f64,
    pub shannon_entropy: f64,
    pub mean: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub peak_to_peak: f64,
    pub zero_crossing_rate: f64,
    pub kurtosis: f64,
    pub skewness: f64,
    pub snr: f64,
    pub spike_count: i64,
}

impl From<&MergedRow<String>> for StatisticalFeatureRow {
    fn from(row: &MergedRow<String>) -> Self {
        Self {
            session_id: row.session_id,
            recording_filename: row.recording_filename.clone(),
            channel: row.key.clone(),
            amplitude_modulation: row.get_or("amplitude_modulation", 0.0),
            event_related_dynamics: row.get_or("event_related_dynamics", 0.0),
            spectral_entropy: row.get_or("spectral_entropy", 0.0),
            signal_variance: row.get_or("signal_variance", 0.0),
            hjorth_activity: row.get_or("hjorth_activity", 0.0),
            hjorth_mobility: row.get_or("hjorth_mobility", 0.0),
            hjorth_complexity: row.get_or("hjorth_complexity", 0.0),
            peak_to_peak_amplitude: row.get_or("peak_to_peak_amplitude", 0.0),
            shannon_entropy: row.get_or("shannon_entropy", 0.0),
            mean: row.get_or("mean", 0.0),
            variance: row.get_or("variance", 0.0),
            standard_deviation: row.get_or("standard_deviation", 0.0),
            peak_to_peak: row.get_or("peak_to_peak", 0.0),
            zero_crossing_rate: row.get_or("zero_crossing_rate", 0.0),
            kurtosis: row.get_or("kurtosis", 0.0),
            skewness: row.get_or("skewness", 0.0),
            snr: row.get_or("snr", f64::NAN),
            spike_count: row.get_or("spike_count", 0.0) as i64,
        }
    }
}

/// One `(channel, band)` of spectral and wavelet power (`tfr_features`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfrFeatureRow {
    pub session_id: i64,
    pub recording_filename: String,
    pub channel: String,
    pub band: String,
    pub power_tfr_morlet: f64,
    pub power_psd_welch: f64,
    pub power_psd_welch_normalized: f64,
    pub band_power: f64,
    pub relative_power: f64,
}

impl From<&MergedRow<ChannelBandKey>> for TfrFeatureRow {
    fn from(row: &MergedRow<ChannelBandKey>) -> Self {
        Self {
            session_id: row.session_id,
            recording_filename: row.recording_filename.clone(),
            channel: row.key.channel.clone(),
            band: row.key.band.clone(),
            power_tfr_morlet: row.get_or("power_tfr_morlet", f64::NAN),
            power_psd_welch: row.get_or("power_psd_welch", f64::NAN),
            power_psd_welch_normalized: row.get_or("power_psd_welch_normalized", f64::NAN),
            band_power: row.get_or("band_power", 0.0),
            relative_power: row.get_or("relative_power", 0.0),
        }
    }
}

/// One channel pair within a band (`connectivity_features`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectivityFeatureRow {
    pub session_id: i64,
    pub recording_filename: String,
    pub channel_1: String,
    pub channel_2: String,
    pub band: String,
    pub plv: f64,
    pub coherence: f64,
}

impl From<&MergedRow<PairBandKey>> for ConnectivityFeatureRow {
    fn from(row: &MergedRow<PairBandKey>) -> Self {
        Self {
            session_id: row.session_id,
            recording_filename: row.recording_filename.clone(),
            channel_1: row.key.channel_1.clone(),
            channel_2: row.key.channel_2.clone(),
            band: row.key.band.clone(),
            plv: row.get_or("plv", 0.0),
            coherence: row.get_or("coherence", f64::NAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::SessionTag;
    use crate::features::merge::FeatureMerger;
    use crate::analysis::morlet::MorletBandFeatures;
    use crate::analysis::statistics::StatisticalFeatures;
    use crate::analysis::temporal::TemporalFeatures;

    fn stats(channel: &str) -> StatisticalFeatures {
        StatisticalFeatures {
            channel: channel.to_string(),
            shannon_entropy: 1.5,
            mean: 0.1,
            variance: 2.0,
            standard_deviation: 2.0_f64.sqrt(),
            peak_to_peak: 4.0,
            zero_crossing_rate: 0.3,
            kurtosis: -1.0,
            skewness: 0.0,
            snr: 1.2,
            spike_count: 3,
        }
    }

    #[test]
    fn statistical_row_defaults_missing_sources() {
        let mut merger = FeatureMerger::new();
        merger
            .add_source("statistical", &[stats("Fp1")])
            .add_source(
                "temporal",
                &[TemporalFeatures {
                    channel: "Fp2".into(),
                    amplitude_modulation: 0.4,
                    event_related_dynamics: 5.0,
                }],
            );
        let rows: Vec<StatisticalFeatureRow> = merger
            .finish(&SessionTag::new(3, "p01.edf"))
            .iter()
            .map(StatisticalFeatureRow::from)
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].channel, "Fp1");
        assert_eq!(rows[0].spike_count, 3);
        assert_eq!(rows[0].amplitude_modulation, 0.0);
        assert_eq!(rows[1].channel, "Fp2");
        assert_eq!(rows[1].mean, 0.0);
        assert!(rows[1].snr.is_nan());
        assert_eq!(rows[1].event_related_dynamics, 5.0);
    }

    #[test]
    fn tfr_row_keeps_nan_sentinels_for_absent_power() {
        let mut merger = FeatureMerger::new();
        merger.add_source(
            "morlet",
            &[MorletBandFeatures {
                channel: "Cz".into(),
                band: "alpha",
                power_tfr_morlet: 0.8,
            }],
        );
        let rows = merger.finish(&SessionTag::new(1, "a.edf"));
        let row = TfrFeatureRow::from(&rows[0]);
        assert_eq!(row.band, "alpha");
        assert_eq!(row.power_tfr_morlet, 0.8);
        assert!(row.power_psd_welch.is_nan());
        assert_eq!(row.band_power, 0.0);
    }
}
