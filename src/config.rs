//! TOML settings shared by the command-line tools.
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! The default location is `config.toml` under the application directory
//! (see [`crate::app_dirs`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::app_dirs;
use crate::dataset::LoadOptions;
use crate::logging::LoggingSettings;
use crate::ml::registry::{ModelKind, ModelOptions};
use crate::pipeline::{ExtractionSettings, PipelineError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML: {0}")]
    SerializeToml(#[from] toml::ser::Error),
    #[error("No suitable config directory found")]
    NoConfigDir,
    #[error("Invalid extraction settings: {0}")]
    Extraction(#[from] PipelineError),
    #[error("Invalid dataset settings: test_size must be in (0, 1), got {0}")]
    TestSize(f64),
}

/// `[model]` section: which model to train and its hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub kind: ModelKind,
    #[serde(flatten)]
    pub options: ModelOptions,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            kind: ModelKind::LogisticRegression,
            options: ModelOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Feature database; the application directory's `features.db` when unset.
    pub database: Option<PathBuf>,
    pub logging: LoggingSettings,
    pub extraction: ExtractionSettings,
    pub dataset: LoadOptions,
    pub model: ModelSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.extraction.validate()?;
        let test_size = self.dataset.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ConfigError::TestSize(test_size));
        }
        Ok(())
    }

    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database {
            Some(path) => Ok(path.clone()),
            None => app_dirs::default_database_path().map_err(map_app_dir_error),
        }
    }
}

/// Resolve the default settings file path, ensuring its directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    app_dirs::config_file().map_err(map_app_dir_error)
}

/// Load settings from the default location, falling back to defaults.
pub fn load_or_default() -> Result<Settings, ConfigError> {
    load_from(&config_path()?)
}

/// Load and validate settings from `path`; a missing file yields defaults.
pub fn load_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        debug!(path = %path.display(), "No settings file; using defaults");
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings: Settings = toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Write settings as TOML, creating parent directories as needed.
pub fn save_to_path(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings)?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::phase::PhasePolicy;
    use crate::pipeline::ExtractionStep;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.dataset.label_column, "cognitive_load_status");
        assert_eq!(settings.extraction.steps.len(), 8);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
database = "features.db"

[extraction]
steps = ["psd", "plv"]

[extraction.statistical]
entropy_bins = 50

[extraction.connectivity]
phase = "fft_angle"

[dataset]
test_size = 0.25

[model]
kind = "gradient_boosting"

[model.gradient_boosting]
rounds = 10
"#,
        )
        .unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.database, Some(PathBuf::from("features.db")));
        assert_eq!(settings.extraction.steps, vec![ExtractionStep::Psd, ExtractionStep::Plv]);
        assert_eq!(settings.extraction.statistical.entropy_bins, 50);
        assert_eq!(settings.extraction.statistical.spike_threshold_multiplier, 5.0);
        assert_eq!(settings.extraction.connectivity.phase, PhasePolicy::FftAngle);
        assert_eq!(settings.extraction.connectivity.max_channels, 64);
        assert_eq!(settings.dataset.test_size, 0.25);
        assert_eq!(settings.dataset.random_state, 42);
        assert_eq!(settings.model.kind, ModelKind::GradientBoosting);
        assert_eq!(settings.model.options.gradient_boosting.rounds, 10);
    }

    #[test]
    fn unknown_step_and_bad_test_size_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[extraction]\nsteps = [\"wavelets\"]\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::ParseToml { .. })));

        std::fs::write(&path, "[dataset]\ntest_size = 1.5\n").unwrap();
        assert!(matches!(load_from(&path), Err(ConfigError::TestSize(_))));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut settings = Settings::default();
        settings.database = Some(dir.path().join("db.sqlite"));
        settings.extraction.hjorth_max_channels = 8;
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
    }
}
