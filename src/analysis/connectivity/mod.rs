//! Pairwise channel connectivity: phase-locking value and coherence.
//!
//! Both measures are evaluated for every unordered pair `i < j` of the first
//! `max_channels` channels. Pairs are independent and run on the rayon pool;
//! results come back in pair order.

pub mod coherence;
pub mod plv;

use serde::{Deserialize, Serialize};

use super::phase::PhasePolicy;
use crate::bands::Band;

pub use coherence::{CoherenceFeatures, coherence_matrix, extract_coherence_features};
pub use plv::{PlvFeatures, extract_plv_features, plv_matrix};

/// Settings shared by the connectivity extractors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityParams {
    pub max_channels: usize,
    pub phase: PhasePolicy,
    /// Coherence segment length in samples.
    pub nperseg: usize,
}

impl Default for ConnectivityParams {
    fn default() -> Self {
        Self {
            max_channels: 64,
            phase: PhasePolicy::default(),
            nperseg: 1024,
        }
    }
}

/// Which bands a connectivity invocation covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandSelection<'a> {
    Single(&'a Band),
    All(&'a [Band]),
}

impl<'a> BandSelection<'a> {
    pub fn bands(&self) -> &'a [Band] {
        match *self {
            BandSelection::Single(band) => std::slice::from_ref(band),
            BandSelection::All(bands) => bands,
        }
    }
}

/// Unordered index pairs `(i, j)` with `i < j`, row-major.
pub fn channel_pairs(n_channels: usize) -> Vec<(usize, usize)> {
    (0..n_channels)
        .flat_map(|i| ((i + 1)..n_channels).map(move |j| (i, j)))
        .collect()
}

/// Symmetric channel-by-channel matrix with an unused diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct PairMatrix {
    n_channels: usize,
    upper: Vec<f64>,
}

impl PairMatrix {
    /// Build from values aligned with [`channel_pairs`]`(n_channels)`.
    pub fn from_pair_values(n_channels: usize, values: Vec<f64>) -> Self {
        debug_assert_eq!(values.len(), n_channels * n_channels.saturating_sub(1) / 2);
        Self {
            n_channels,
            upper: values,
        }
    }

    pub fn n_channels(&self) -> usize {
        self.n_channels
    }

    /// Value for `(i, j)` in either order; `None` on the diagonal or out of range.
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        if i == j || i >= self.n_channels || j >= self.n_channels {
            return None;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        // rows before `lo` contribute (n-1) + (n-2) + ... entries
        let row_start = lo * (2 * self.n_channels - lo - 1) / 2;
        self.upper.get(row_start + (hi - lo - 1)).copied()
    }

    /// Values in [`channel_pairs`] order.
    pub fn pair_values(&self) -> &[f64] {
        &self.upper
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{ALPHA, CONNECTIVITY_BANDS};

    #[test]
    fn pairs_are_unique_and_ordered() {
        assert_eq!(channel_pairs(4), vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        assert!(channel_pairs(1).is_empty());
    }

    #[test]
    fn matrix_lookup_is_symmetric() {
        let pairs = channel_pairs(4);
        let values: Vec<f64> = (0..pairs.len()).map(|v| v as f64).collect();
        let matrix = PairMatrix::from_pair_values(4, values);
        for (idx, &(i, j)) in pairs.iter().enumerate() {
            assert_eq!(matrix.get(i, j), Some(idx as f64));
            assert_eq!(matrix.get(j, i), Some(idx as f64));
        }
        assert_eq!(matrix.get(2, 2), None);
        assert_eq!(matrix.get(0, 9), None);
    }

    #[test]
    fn band_selection_modes() {
        assert_eq!(BandSelection::Single(&ALPHA).bands(), &[ALPHA]);
        assert_eq!(BandSelection::All(&CONNECTIVITY_BANDS).bands().len(), 5);
    }
}
