//! Multichannel EEG recordings as consumed by the extractors.
//!
//! Decoding EDF/FIF files is left to an external reader; anything that can
//! hand over a channel × sample matrix, channel names and a sample rate can
//! implement [`RecordingSource`]. A small JSON interchange format is supported
//! so the command-line tools can run without such a reader.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or reading a recording.
#[derive(Debug, Error)]
pub enum RecordingError {
    #[error("Failed to read recording {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid recording JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Recording has no channels")]
    NoChannels,
    #[error("Recording has no samples")]
    NoSamples,
    #[error("Sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f64),
    #[error("{names} channel names for {rows} data rows")]
    ChannelCountMismatch { names: usize, rows: usize },
    #[error("Channel {channel} has {found} samples, expected {expected}")]
    LengthMismatch {
        channel: String,
        expected: usize,
        found: usize,
    },
    #[error("Duplicate channel name: {0}")]
    DuplicateChannel(String),
}

/// Getter interface offered by an EEG reader.
pub trait RecordingSource {
    /// Channel names in acquisition order.
    fn channel_names(&self) -> &[String];
    /// Uniform sample rate in Hz.
    fn sample_rate(&self) -> f64;
    /// Channel × sample matrix, rows aligned with [`RecordingSource::channel_names`].
    fn data(&self) -> &[Vec<f64>];
}

/// Immutable multichannel recording sharing one sample rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    channel_names: Vec<String>,
    sample_rate: f64,
    data: Vec<Vec<f64>>,
}

/// Borrowed view of one channel.
#[derive(Debug, Clone, Copy)]
pub struct ChannelView<'a> {
    pub index: usize,
    pub name: &'a str,
    pub samples: &'a [f64],
}

impl Recording {
    /// Build a recording, validating shape, names and sample rate.
    pub fn new(
        channel_names: Vec<String>,
        sample_rate: f64,
        data: Vec<Vec<f64>>,
    ) -> Result<Self, RecordingError> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(RecordingError::InvalidSampleRate(sample_rate));
        }
        if channel_names.len() != data.len() {
            return Err(RecordingError::ChannelCountMismatch {
                names: channel_names.len(),
                rows: data.len(),
            });
        }
        if data.is_empty() {
            return Err(RecordingError::NoChannels);
        }
        let expected = data[0].len();
        if expected == 0 {
            return Err(RecordingError::NoSamples);
        }
        let mut seen = HashSet::with_capacity(channel_names.len());
        for (name, row) in channel_names.iter().zip(&data) {
            if !seen.insert(name.as_str()) {
                return Err(RecordingError::DuplicateChannel(name.clone()));
            }
            if row.len() != expected {
                return Err(RecordingError::LengthMismatch {
                    channel: name.clone(),
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(Self {
            channel_names,
            sample_rate,
            data,
        })
    }

    /// Copy the contents of any [`RecordingSource`].
    pub fn from_source(source: &impl RecordingSource) -> Result<Self, RecordingError> {
        Self::new(
            source.channel_names().to_vec(),
            source.sample_rate(),
            source.data().to_vec(),
        )
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn data(&self) -> &[Vec<f64>] {
        &self.data
    }

    pub fn n_channels(&self) -> usize {
        self.channel_names.len()
    }

    pub fn n_samples(&self) -> usize {
        self.data.first().map(Vec::len).unwrap_or(0)
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.n_samples() as f64 / self.sample_rate
    }

    pub fn channel(&self, index: usize) -> Option<ChannelView<'_>> {
        Some(ChannelView {
            index,
            name: self.channel_names.get(index)?,
            samples: self.data.get(index)?,
        })
    }

    /// Iterate channels in acquisition order.
    pub fn channels(&self) -> impl Iterator<Item = ChannelView<'_>> {
        self.channel_names
            .iter()
            .zip(&self.data)
            .enumerate()
            .map(|(index, (name, samples))| ChannelView {
                index,
                name,
                samples,
            })
    }

    /// Number of leading channels kept when capping at `max_channels`.
    pub fn capped_channel_count(&self, max_channels: usize) -> usize {
        self.n_channels().min(max_channels.max(1))
    }

    /// Copy of the first `max_channels` channels; the whole recording when already smaller.
    pub fn first_channels(&self, max_channels: usize) -> Recording {
        let keep = self.capped_channel_count(max_channels);
        Recording {
            channel_names: self.channel_names[..keep].to_vec(),
            sample_rate: self.sample_rate,
            data: self.data[..keep].to_vec(),
        }
    }
}

impl RecordingSource for Recording {
    fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn data(&self) -> &[Vec<f64>] {
        &self.data
    }
}

/// On-disk JSON layout for a recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingFile {
    pub sample_rate: f64,
    pub channels: Vec<ChannelFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelFile {
    pub name: String,
    pub samples: Vec<f64>,
}

impl From<&Recording> for RecordingFile {
    fn from(recording: &Recording) -> Self {
        Self {
            sample_rate: recording.sample_rate,
            channels: recording
                .channels()
                .map(|channel| ChannelFile {
                    name: channel.name.to_string(),
                    samples: channel.samples.to_vec(),
                })
                .collect(),
        }
    }
}

/// Read a recording stored in the JSON interchange format.
pub fn read_json_recording(path: &Path) -> Result<Recording, RecordingError> {
    let bytes = std::fs::read(path).map_err(|source| RecordingError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: RecordingFile =
        serde_json::from_slice(&bytes).map_err(|source| RecordingError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let (names, data) = file
        .channels
        .into_iter()
        .map(|channel| (channel.name, channel.samples))
        .unzip();
    Recording::new(names, file.sample_rate, data)
}
