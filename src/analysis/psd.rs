//! Band power derived from the Welch PSD.

use serde::Serialize;
use tracing::warn;

use super::AnalysisError;
use super::welch::{Spectrum, WelchParams, welch_psd};
use crate::bands::Band;
use crate::recording::Recording;

/// Mean Welch PSD inside one band and its share of the channel's total power.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PsdBandFeatures {
    pub channel: String,
    pub band: &'static str,
    /// NaN when no PSD bin falls inside the band.
    pub power_psd_welch: f64,
    pub power_psd_welch_normalized: f64,
}

/// Alternate band view: empty bands report zero power instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandPowerFeatures {
    pub channel: String,
    pub band: &'static str,
    pub band_power: f64,
    pub relative_power: f64,
}

/// One row per `(channel, band)`, channel-major in recording order.
pub fn extract_psd_features(
    recording: &Recording,
    bands: &[Band],
    params: &WelchParams,
) -> Result<Vec<PsdBandFeatures>, AnalysisError> {
    let spectrum = welch_psd(recording, params)?;
    warn_empty_bands(&spectrum, bands);
    Ok(psd_band_rows(recording, &spectrum, bands))
}

pub fn psd_band_rows(
    recording: &Recording,
    spectrum: &Spectrum,
    bands: &[Band],
) -> Vec<PsdBandFeatures> {
    let mut rows = Vec::with_capacity(spectrum.n_channels() * bands.len());
    for channel in recording.channels().take(spectrum.n_channels()) {
        let psd = spectrum.channel(channel.index).unwrap_or(&[]);
        let total = spectrum.total_power(channel.index);
        for band in bands {
            let power = band.mean_over(&spectrum.freqs, psd).unwrap_or(f64::NAN);
            rows.push(PsdBandFeatures {
                channel: channel.name.to_string(),
                band: band.name,
                power_psd_welch: power,
                power_psd_welch_normalized: normalized_power(power, total),
            });
        }
    }
    rows
}

/// `band_power / total_power`, 0 when the total is 0.
pub fn normalized_power(band_power: f64, total_power: f64) -> f64 {
    if total_power == 0.0 {
        0.0
    } else {
        band_power / total_power
    }
}

/// Unbanded total PSD power per channel.
pub fn total_power(recording: &Recording, params: &WelchParams) -> Result<Vec<f64>, AnalysisError> {
    let spectrum = welch_psd(recording, params)?;
    Ok((0..spectrum.n_channels())
        .map(|idx| spectrum.total_power(idx))
        .collect())
}

/// Normalized band power only, `normalized[channel][band]`.
pub fn normalized_band_power(
    recording: &Recording,
    bands: &[Band],
    params: &WelchParams,
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let rows = extract_psd_features(recording, bands, params)?;
    Ok(rows
        .chunks(bands.len().max(1))
        .map(|chunk| chunk.iter().map(|row| row.power_psd_welch_normalized).collect())
        .collect())
}

/// Band and relative power for at most `max_channels` channels.
pub fn extract_band_power(
    recording: &Recording,
    bands: &[Band],
    params: &WelchParams,
    max_channels: usize,
) -> Result<Vec<BandPowerFeatures>, AnalysisError> {
    let capped = recording.first_channels(max_channels);
    let spectrum = welch_psd(&capped, params)?;
    let mut rows = Vec::with_capacity(capped.n_channels() * bands.len());
    for channel in capped.channels() {
        let psd = spectrum.channel(channel.index).unwrap_or(&[]);
        let total = spectrum.total_power(channel.index);
        for band in bands {
            let power = band.mean_over(&spectrum.freqs, psd).unwrap_or(0.0);
            rows.push(BandPowerFeatures {
                channel: channel.name.to_string(),
                band: band.name,
                band_power: power,
                relative_power: normalized_power(power, total),
            });
        }
    }
    Ok(rows)
}

fn warn_empty_bands(spectrum: &Spectrum, bands: &[Band]) {
    for band in bands {
        if band.bin_indices(&spectrum.freqs).is_empty() {
            warn!(
                band = band.name,
                low_hz = band.low_hz,
                high_hz = band.high_hz,
                "No PSD bins inside band; band power is NaN"
            );
        }
    }
}
