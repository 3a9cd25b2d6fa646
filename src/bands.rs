//! Named EEG frequency bands shared by every spectral extractor.

use serde::{Deserialize, Serialize};

/// Half-open frequency interval `[low_hz, high_hz)` with a stable name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub name: &'static str,
    pub low_hz: f64,
    pub high_hz: f64,
}

impl Band {
    pub const fn new(name: &'static str, low_hz: f64, high_hz: f64) -> Self {
        Self {
            name,
            low_hz,
            high_hz,
        }
    }

    /// True when `freq_hz` lies inside `[low_hz, high_hz)`.
    pub fn contains(&self, freq_hz: f64) -> bool {
        freq_hz >= self.low_hz && freq_hz < self.high_hz
    }

    /// Indices of `freqs` that fall inside the band.
    pub fn bin_indices(&self, freqs: &[f64]) -> Vec<usize> {
        freqs
            .iter()
            .enumerate()
            .filter(|(_, f)| self.contains(**f))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Mean of `values` over the bins of `freqs` inside the band, `None` when no bin matches.
    pub fn mean_over(&self, freqs: &[f64], values: &[f64]) -> Option<f64> {
        let indices = self.bin_indices(freqs);
        if indices.is_empty() {
            return None;
        }
        let sum: f64 = indices
            .iter()
            .map(|&idx| values.get(idx).copied().unwrap_or(0.0))
            .sum();
        Some(sum / indices.len() as f64)
    }
}

pub const DELTA: Band = Band::new("delta", 1.0, 4.0);
pub const THETA: Band = Band::new("theta", 4.0, 8.0);
pub const ALPHA: Band = Band::new("alpha", 8.0, 13.0);
pub const BETA: Band = Band::new("beta", 13.0, 30.0);
pub const GAMMA: Band = Band::new("gamma", 30.0, 50.0);
pub const GAMMA_HIGH: Band = Band::new("gamma_high", 50.0, 99.0);

/// Band order used by power and time-frequency features.
pub const STANDARD_BANDS: [Band; 6] = [DELTA, THETA, ALPHA, BETA, GAMMA, GAMMA_HIGH];

/// Band order used by connectivity features (no `gamma_high`).
pub const CONNECTIVITY_BANDS: [Band; 5] = [DELTA, THETA, ALPHA, BETA, GAMMA];

/// Selectable band table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandSet {
    #[default]
    Standard,
    Connectivity,
}

impl BandSet {
    pub fn bands(self) -> &'static [Band] {
        match self {
            BandSet::Standard => &STANDARD_BANDS,
            BandSet::Connectivity => &CONNECTIVITY_BANDS,
        }
    }
}

/// Look up a band from the standard table by name.
pub fn band_by_name(name: &str) -> Option<Band> {
    STANDARD_BANDS.iter().copied().find(|band| band.name == name)
}
