//! Logging setup for the command-line tools.
//!
//! Installs one global tracing subscriber writing to stdout and to a per-run
//! `neuroinsights_<timestamp>.log` file. Library code only emits events;
//! binaries call [`init`] once at startup.

use std::{
    fs::{self, OpenOptions},
    path::{Path, PathBuf},
    sync::OnceLock,
};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

use crate::app_dirs;

const LOG_FILE_PREFIX: &str = "neuroinsights_";
const LOG_FILE_EXTENSION: &str = "log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// `[logging]` section of the settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Number of run logs kept after pruning.
    pub max_files: usize,
    /// Log directory; defaults to `logs/` under the application root.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            max_files: 10,
            directory: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("No suitable data directory available for logs")]
    NoDataDir,
    #[error("Failed to prepare log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read log directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to remove old log file {path}: {source}")]
    RemoveFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to format log filename time: {0}")]
    FormatTime(time::error::Format),
    #[error("Invalid log filter '{directive}': {source}")]
    Filter {
        directive: String,
        source: tracing_subscriber::filter::ParseError,
    },
    #[error("Failed to install global tracing subscriber: {0}")]
    SetGlobal(tracing::subscriber::SetGlobalDefaultError),
    #[error("Failed to create log file at {path}: {source}")]
    CreateLogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Install the stdout + file subscriber and return the run's log file path.
///
/// Subsequent calls are no-ops and return `None`.
pub fn init(settings: &LoggingSettings) -> Result<Option<PathBuf>, LoggingError> {
    if LOG_GUARD.get().is_some() {
        return Ok(None);
    }

    let log_dir = log_directory(settings)?;
    let log_file_name = format_log_file_name(now_local_or_utc())?;
    let log_path = log_dir.join(&log_file_name);
    create_log_file(&log_path)?;
    let removed = prune_old_logs(&log_dir, settings.max_files.max(1))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(rolling::never(&log_dir, &log_file_name));
    let timer = build_timer();
    let stdout_layer = fmt::layer()
        .with_timer(timer.clone())
        .with_writer(std::io::stdout);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_timer(timer)
        .with_writer(file_writer);

    let subscriber = Registry::default()
        .with(build_env_filter(&settings.level)?)
        .with(stdout_layer)
        .with(file_layer);
    tracing::subscriber::set_global_default(subscriber).map_err(LoggingError::SetGlobal)?;
    let _ = LOG_GUARD.set(guard);

    tracing::info!(path = %log_path.display(), pruned = removed, "Logging initialized");
    Ok(Some(log_path))
}

fn log_directory(settings: &LoggingSettings) -> Result<PathBuf, LoggingError> {
    match &settings.directory {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.clone(),
                source,
            })?;
            Ok(dir.clone())
        }
        None => app_dirs::logs_dir().map_err(|error| match error {
            app_dirs::AppDirError::NoBaseDir => LoggingError::NoDataDir,
            app_dirs::AppDirError::CreateDir { path, source } => {
                LoggingError::CreateDir { path, source }
            }
        }),
    }
}

fn create_log_file(path: &Path) -> Result<(), LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|source| LoggingError::CreateLogFile {
            path: path.to_path_buf(),
            source,
        })
}

/// Delete the oldest run logs beyond `keep`; returns how many were removed.
///
/// Only `neuroinsights_*.log` files are considered. Their timestamped names
/// sort chronologically.
fn prune_old_logs(dir: &Path, keep: usize) -> Result<usize, LoggingError> {
    let mut logs: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|source| LoggingError::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_run_log(path))
        .collect();
    logs.sort();

    let excess = logs.len().saturating_sub(keep);
    for path in &logs[..excess] {
        fs::remove_file(path).map_err(|source| LoggingError::RemoveFile {
            path: path.clone(),
            source,
        })?;
    }
    Ok(excess)
}

fn is_run_log(path: &Path) -> bool {
    path.is_file()
        && path.extension().and_then(|ext| ext.to_str()) == Some(LOG_FILE_EXTENSION)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
}

fn format_log_file_name(now: OffsetDateTime) -> Result<String, LoggingError> {
    const NAME_FORMAT: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    let stamp = now.format(NAME_FORMAT).map_err(LoggingError::FormatTime)?;
    Ok(format!("{LOG_FILE_PREFIX}{stamp}.{LOG_FILE_EXTENSION}"))
}

fn build_timer() -> fmt::time::OffsetTime<time::format_description::BorrowedFormatItem<'static>> {
    const DISPLAY_FORMAT: &[FormatItem<'static>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    fmt::time::OffsetTime::new(offset, DISPLAY_FORMAT.into())
}

fn now_local_or_utc() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| LoggingError::Filter {
        directive: level.to_string(),
        source,
    })
}
