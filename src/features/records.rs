use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::analysis::connectivity::{CoherenceFeatures, PlvFeatures};
use crate::analysis::hjorth::HjorthFeatures;
use crate::analysis::morlet::MorletBandFeatures;
use crate::analysis::psd::{BandPowerFeatures, PsdBandFeatures};
use crate::analysis::statistics::StatisticalFeatures;
use crate::analysis::temporal::TemporalFeatures;

/// A keyed set of named numeric features produced by one extractor.
pub trait FeatureRecord {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> Self::Key;

    /// Named values in the extractor's declared field order.
    fn fields(&self) -> Vec<(&'static str, f64)>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelBandKey {
    pub channel: String,
    pub band: String,
}

impl ChannelBandKey {
    pub fn new(channel: &str, band: &str) -> Self {
        Self {
            channel: channel.to_string(),
            band: band.to_string(),
        }
    }
}

/// Unordered channel pair (stored in channel order) within one band.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairBandKey {
    pub channel_1: String,
    pub channel_2: String,
    pub band: String,
}

impl PairBandKey {
    pub fn new(channel_1: &str, channel_2: &str, band: &str) -> Self {
        Self {
            channel_1: channel_1.to_string(),
            channel_2: channel_2.to_string(),
            band: band.to_string(),
        }
    }
}

impl FeatureRecord for StatisticalFeatures {
    type Key = String;

    fn key(&self) -> String {
        self.channel.clone()
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("shannon_entropy", self.shannon_entropy),
            ("mean", self.mean),
            ("variance", self.variance),
            ("standard_deviation", self.standard_deviation),
            ("peak_to_peak", self.peak_to_peak),
            ("zero_crossing_rate", self.zero_crossing_rate),
            ("kurtosis", self.kurtosis),
            ("skewness", self.skewness),
            ("snr", self.snr),
            ("spike_count", f64::from(self.spike_count)),
        ]
    }
}

impl FeatureRecord for TemporalFeatures {
    type Key = String;

    fn key(&self) -> String {
        self.channel.clone()
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("amplitude_modulation", self.amplitude_modulation),
            ("event_related_dynamics", self.event_related_dynamics),
        ]
    }
}

impl FeatureRecord for HjorthFeatures {
    type Key = String;

    fn key(&self) -> String {
        self.channel.clone()
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("spectral_entropy", self.spectral_entropy),
            ("signal_variance", self.signal_variance),
            ("hjorth_activity", self.hjorth_activity),
            ("hjorth_mobility", self.hjorth_mobility),
            ("hjorth_complexity", self.hjorth_complexity),
            ("peak_to_peak_amplitude", self.peak_to_peak_amplitude),
        ]
    }
}

impl FeatureRecord for PsdBandFeatures {
    type Key = ChannelBandKey;

    fn key(&self) -> ChannelBandKey {
        ChannelBandKey::new(&self.channel, self.band)
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("power_psd_welch", self.power_psd_welch),
            ("power_psd_welch_normalized", self.power_psd_welch_normalized),
        ]
    }
}

impl FeatureRecord for BandPowerFeatures {
    type Key = ChannelBandKey;

    fn key(&self) -> ChannelBandKey {
        ChannelBandKey::new(&self.channel, self.band)
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("band_power", self.band_power),
            ("relative_power", self.relative_power),
        ]
    }
}

impl FeatureRecord for MorletBandFeatures {
    type Key = ChannelBandKey;

    fn key(&self) -> ChannelBandKey {
        ChannelBandKey::new(&self.channel, self.band)
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![("power_tfr_morlet", self.power_tfr_morlet)]
    }
}

impl FeatureRecord for PlvFeatures {
    type Key = PairBandKey;

    fn key(&self) -> PairBandKey {
        PairBandKey::new(&self.channel_1, &self.channel_2, self.band)
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![("plv", self.plv)]
    }
}

impl FeatureRecord for CoherenceFeatures {
    type Key = PairBandKey;

    fn key(&self) -> PairBandKey {
        PairBandKey::new(&self.channel_1, &self.channel_2, self.band)
    }

    fn fields(&self) -> Vec<(&'static str, f64)> {
        vec![("coherence", self.coherence)]
    }
}
