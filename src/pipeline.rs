//! Extraction pipeline: recording → enabled extractors → merged feature rows.
//!
//! Steps are a closed enum dispatched with `match`. A batch runs one session
//! per rayon task; a failing recording is reported and skipped while the rest
//! of the batch continues, and results keep input order.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::analysis::AnalysisError;
use crate::analysis::connectivity::{
    BandSelection, CoherenceFeatures, ConnectivityParams, PlvFeatures, extract_coherence_features,
    extract_plv_features,
};
use crate::analysis::hjorth::{HjorthFeatures, extract_hjorth_features};
use crate::analysis::morlet::{MorletBandFeatures, MorletParams, extract_morlet_features};
use crate::analysis::psd::{
    BandPowerFeatures, PsdBandFeatures, extract_band_power, extract_psd_features,
};
use crate::analysis::statistics::{
    StatisticalFeatures, StatisticalParams, extract_statistical_features,
};
use crate::analysis::temporal::{TemporalFeatures, extract_temporal_features};
use crate::analysis::welch::WelchParams;
use crate::bands::BandSet;
use crate::features::{
    ChannelBandKey, ConnectivityFeatureRow, FeatureMerger, PairBandKey, SessionTag,
    StatisticalFeatureRow, TfrFeatureRow,
};
use crate::recording::{Recording, RecordingError, read_json_recording};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unknown extraction step '{0}'")]
    UnknownStep(String),
    #[error(transparent)]
    Recording(#[from] RecordingError),
    #[error("Step {step} failed: {source}")]
    Analysis {
        step: ExtractionStep,
        source: AnalysisError,
    },
    #[error("Invalid extraction settings: {0}")]
    InvalidSettings(#[source] AnalysisError),
}

/// One feature extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStep {
    Statistical,
    Temporal,
    Hjorth,
    Psd,
    BandPower,
    Morlet,
    Plv,
    Coherence,
}

impl ExtractionStep {
    pub const ALL: [ExtractionStep; 8] = [
        ExtractionStep::Statistical,
        ExtractionStep::Temporal,
        ExtractionStep::Hjorth,
        ExtractionStep::Psd,
        ExtractionStep::BandPower,
        ExtractionStep::Morlet,
        ExtractionStep::Plv,
        ExtractionStep::Coherence,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ExtractionStep::Statistical => "statistical",
            ExtractionStep::Temporal => "temporal",
            ExtractionStep::Hjorth => "hjorth",
            ExtractionStep::Psd => "psd",
            ExtractionStep::BandPower => "band_power",
            ExtractionStep::Morlet => "morlet",
            ExtractionStep::Plv => "plv",
            ExtractionStep::Coherence => "coherence",
        }
    }

    /// Parse a comma separated list such as `"psd,plv"`.
    pub fn parse_list(list: &str) -> Result<Vec<ExtractionStep>, PipelineError> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for ExtractionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtractionStep {
    type Err = PipelineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ExtractionStep::ALL
            .into_iter()
            .find(|step| step.name() == value)
            .ok_or_else(|| PipelineError::UnknownStep(value.to_string()))
    }
}

/// `[extraction]` settings: extractor parameters plus the enabled steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub steps: Vec<ExtractionStep>,
    pub statistical: StatisticalParams,
    pub welch: WelchParams,
    pub morlet: MorletParams,
    pub connectivity: ConnectivityParams,
    pub band_power_max_channels: usize,
    pub hjorth_max_channels: usize,
    pub tfr_bands: BandSet,
    pub connectivity_bands: BandSet,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            steps: ExtractionStep::ALL.to_vec(),
            statistical: StatisticalParams::default(),
            welch: WelchParams::default(),
            morlet: MorletParams::default(),
            connectivity: ConnectivityParams::default(),
            band_power_max_channels: 64,
            hjorth_max_channels: 64,
            tfr_bands: BandSet::Standard,
            connectivity_bands: BandSet::Connectivity,
        }
    }
}

impl ExtractionSettings {
    /// Checks that do not depend on a recording's sample rate.
    pub fn validate(&self) -> Result<(), PipelineError> {
        self.welch.validate().map_err(PipelineError::InvalidSettings)
    }

    /// Enabled steps in configured order, duplicates dropped.
    /// Configured steps, deduplicated and in [`ExtractionStep::ALL`] order.
    ///
    /// This order is the merge precedence: a step listed later in `ALL` wins
    /// on a field it shares with an earlier one, however `steps` is written.
    pub fn enabled_steps(&self) -> Vec<ExtractionStep> {
        ExtractionStep::ALL
            .into_iter()
            .filter(|step| self.steps.contains(step))
            .collect()
    }
}

/// Raw extractor output for one step.
#[derive(Debug, Clone)]
pub enum StepOutput {
    Statistical(Vec<StatisticalFeatures>),
    Temporal(Vec<TemporalFeatures>),
    Hjorth(Vec<HjorthFeatures>),
    Psd(Vec<PsdBandFeatures>),
    BandPower(Vec<BandPowerFeatures>),
    Morlet(Vec<MorletBandFeatures>),
    Plv(Vec<PlvFeatures>),
    Coherence(Vec<CoherenceFeatures>),
}

pub fn run_step(
    step: ExtractionStep,
    recording: &Recording,
    settings: &ExtractionSettings,
) -> Result<StepOutput, PipelineError> {
    let tfr_bands = settings.tfr_bands.bands();
    let pair_bands = BandSelection::All(settings.connectivity_bands.bands());
    let output = match step {
        ExtractionStep::Statistical => Ok(StepOutput::Statistical(extract_statistical_features(
            recording,
            &settings.statistical,
        ))),
        ExtractionStep::Temporal => Ok(StepOutput::Temporal(extract_temporal_features(recording))),
        ExtractionStep::Hjorth => {
            extract_hjorth_features(recording, &settings.welch, settings.hjorth_max_channels)
                .map(StepOutput::Hjorth)
        }
        ExtractionStep::Psd => {
            extract_psd_features(recording, tfr_bands, &settings.welch).map(StepOutput::Psd)
        }
        ExtractionStep::BandPower => extract_band_power(
            recording,
            tfr_bands,
            &settings.welch,
            settings.band_power_max_channels,
        )
        .map(StepOutput::BandPower),
        ExtractionStep::Morlet => {
            extract_morlet_features(recording, tfr_bands, &settings.morlet).map(StepOutput::Morlet)
        }
        ExtractionStep::Plv => {
            extract_plv_features(recording, pair_bands, &settings.connectivity).map(StepOutput::Plv)
        }
        ExtractionStep::Coherence => {
            extract_coherence_features(recording, pair_bands, &settings.connectivity)
                .map(StepOutput::Coherence)
        }
    };
    output.map_err(|source| PipelineError::Analysis { step, source })
}

/// Persistable rows for one recording.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionFeatures {
    pub tag: SessionTag,
    pub statistical: Vec<StatisticalFeatureRow>,
    pub tfr: Vec<TfrFeatureRow>,
    pub connectivity: Vec<ConnectivityFeatureRow>,
}

/// Run the enabled steps on one recording and merge their records.
///
/// Steps merge in [`ExtractionStep::ALL`] order (see
/// [`ExtractionSettings::enabled_steps`]).
pub fn extract_session(
    tag: &SessionTag,
    recording: &Recording,
    settings: &ExtractionSettings,
) -> Result<SessionFeatures, PipelineError> {
    let mut channel_rows = FeatureMerger::<String>::new();
    let mut band_rows = FeatureMerger::<ChannelBandKey>::new();
    let mut pair_rows = FeatureMerger::<PairBandKey>::new();

    for step in settings.enabled_steps() {
        let source = step.name();
        match run_step(step, recording, settings)? {
            StepOutput::Statistical(records) => {
                channel_rows.add_source(source, &records);
            }
            StepOutput::Temporal(records) => {
                channel_rows.add_source(source, &records);
            }
            StepOutput::Hjorth(records) => {
                channel_rows.add_source(source, &records);
            }
            StepOutput::Psd(records) => {
                band_rows.add_source(source, &records);
            }
            StepOutput::BandPower(records) => {
                band_rows.add_source(source, &records);
            }
            StepOutput::Morlet(records) => {
                band_rows.add_source(source, &records);
            }
            StepOutput::Plv(records) => {
                pair_rows.add_source(source, &records);
            }
            StepOutput::Coherence(records) => {
                pair_rows.add_source(source, &records);
            }
        }
    }

    Ok(SessionFeatures {
        tag: tag.clone(),
        statistical: channel_rows.finish(tag).iter().map(StatisticalFeatureRow::from).collect(),
        tfr: band_rows.finish(tag).iter().map(TfrFeatureRow::from).collect(),
        connectivity: pair_rows.finish(tag).iter().map(ConnectivityFeatureRow::from).collect(),
    })
}

/// Produces a recording for a batch entry.
pub trait RecordingLoader: Sync {
    fn load(&self, job: &SessionJob) -> Result<Recording, RecordingError>;
}

/// Loads recordings stored in the JSON interchange format.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordingLoader;

impl RecordingLoader for JsonRecordingLoader {
    fn load(&self, job: &SessionJob) -> Result<Recording, RecordingError> {
        read_json_recording(&job.path)
    }
}

/// One recording to extract, already registered as a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionJob {
    pub tag: SessionTag,
    pub path: PathBuf,
}

/// Progress snapshot passed to an [`ExtractionReporter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionProgress {
    pub processed: usize,
    pub total: usize,
    pub failed: usize,
}

/// Receives batch events; called from worker threads.
pub trait ExtractionReporter: Sync {
    fn session_finished(&self, features: &SessionFeatures, progress: ExtractionProgress);
    fn session_failed(&self, tag: &SessionTag, error: &PipelineError, progress: ExtractionProgress);
}

/// Reporter that logs through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ExtractionReporter for TracingReporter {
    fn session_finished(&self, features: &SessionFeatures, progress: ExtractionProgress) {
        info!(
            recording = %features.tag.recording_filename,
            statistical = features.statistical.len(),
            tfr = features.tfr.len(),
            connectivity = features.connectivity.len(),
            processed = progress.processed,
            total = progress.total,
            "Extracted session"
        );
    }

    fn session_failed(
        &self,
        tag: &SessionTag,
        error: &PipelineError,
        progress: ExtractionProgress,
    ) {
        warn!(
            recording = %tag.recording_filename,
            processed = progress.processed,
            total = progress.total,
            "Skipping recording: {error}"
        );
    }
}

#[derive(Debug)]
pub struct BatchFailure {
    pub tag: SessionTag,
    pub error: PipelineError,
}

/// Outcome of [`process_batch`]; both lists keep input order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<SessionFeatures>,
    pub failures: Vec<BatchFailure>,
}

pub fn process_batch<L: RecordingLoader>(
    jobs: &[SessionJob],
    loader: &L,
    settings: &ExtractionSettings,
    reporter: &dyn ExtractionReporter,
) -> BatchSummary {
    let total = jobs.len();
    let processed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);

    let outcomes: Vec<Result<SessionFeatures, BatchFailure>> = jobs
        .par_iter()
        .map(|job| {
            let outcome = loader
                .load(job)
                .map_err(PipelineError::from)
                .and_then(|recording| extract_session(&job.tag, &recording, settings));
            let failed_now = if outcome.is_err() {
                failed.fetch_add(1, Ordering::Relaxed) + 1
            } else {
                failed.load(Ordering::Relaxed)
            };
            let progress = ExtractionProgress {
                processed: processed.fetch_add(1, Ordering::Relaxed) + 1,
                total,
                failed: failed_now,
            };
            match outcome {
                Ok(features) => {
                    reporter.session_finished(&features, progress);
                    Ok(features)
                }
                Err(error) => {
                    reporter.session_failed(&job.tag, &error, progress);
                    Err(BatchFailure {
                        tag: job.tag.clone(),
                        error,
                    })
                }
            }
        })
        .collect();

    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        match outcome {
            Ok(features) => summary.results.push(features),
            Err(failure) => summary.failures.push(failure),
        }
    }
    info!(
        succeeded = summary.results.len(),
        failed = summary.failures.len(),
        "Extraction batch finished"
    );
    summary
}
