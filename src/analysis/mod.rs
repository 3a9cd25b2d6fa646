//! Feature extractors for multichannel EEG recordings.
//!
//! Every extractor is a pure function of a [`crate::recording::Recording`]
//! and its parameters. Degenerate numeric cases (zero variance, zero power,
//! empty bands) yield documented `NaN`/`0.0` sentinels; only invalid
//! parameters surface as [`AnalysisError`].

pub mod connectivity;
pub(crate) mod fft;
pub mod filter;
pub mod hjorth;
pub(crate) mod moments;
pub mod morlet;
pub mod phase;
pub mod psd;
pub mod statistics;
pub mod temporal;
pub mod welch;

use thiserror::Error;

/// Errors raised by extractors for parameters they cannot honor.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{freqs} frequencies but {cycles} cycle counts")]
    FrequencyGridMismatch { freqs: usize, cycles: usize },
    #[error("Frequency grid is empty")]
    EmptyFrequencyGrid,
    #[error("Wavelet frequency must be positive and below Nyquist ({nyquist} Hz), got {freq}")]
    InvalidFrequency { freq: f64, nyquist: f64 },
    #[error("Cycle count must be positive, got {0}")]
    InvalidCycles(f64),
    #[error("Invalid Welch parameters: {0}")]
    InvalidWelch(String),
    #[error("Cannot band-pass {low}-{high} Hz at sample rate {sample_rate} Hz")]
    InvalidPassBand {
        low: f64,
        high: f64,
        sample_rate: f64,
    },
    #[error("Decimation factor must be at least 1")]
    InvalidDecimation,
}
