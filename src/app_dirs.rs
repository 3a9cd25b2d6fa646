//! Application directory helpers anchored to a single `.neuroinsights` folder.
//!
//! Config, logs and the default feature database live under the OS config
//! directory unless `NEUROINSIGHTS_CONFIG_HOME` points somewhere else.

use std::{
    path::PathBuf,
    sync::{LazyLock, Mutex},
};

use directories::BaseDirs;
use thiserror::Error;

pub const APP_DIR_NAME: &str = ".neuroinsights";
pub const CONFIG_HOME_ENV: &str = "NEUROINSIGHTS_CONFIG_HOME";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const DATABASE_FILE_NAME: &str = "features.db";

static CONFIG_BASE_OVERRIDE: LazyLock<Mutex<Option<PathBuf>>> = LazyLock::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.neuroinsights` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir().ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join("logs"))
}

/// Default settings file; the file itself is not created.
pub fn config_file() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(CONFIG_FILE_NAME))
}

pub fn default_database_path() -> Result<PathBuf, AppDirError> {
    Ok(app_root_dir()?.join(DATABASE_FILE_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

fn config_base_dir() -> Option<PathBuf> {
    if let Some(path) = CONFIG_BASE_OVERRIDE
        .lock()
        .ok()
        .and_then(|guard| guard.clone())
    {
        return Some(path);
    }
    if let Ok(path) = std::env::var(CONFIG_HOME_ENV) {
        return Some(PathBuf::from(path));
    }
    BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf())
}

#[cfg(test)]
fn set_config_base_override(path: Option<PathBuf>) {
    let mut guard = CONFIG_BASE_OVERRIDE
        .lock()
        .expect("config base override mutex poisoned");
    *guard = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    struct OverrideGuard;

    impl OverrideGuard {
        fn set(path: PathBuf) -> Self {
            set_config_base_override(Some(path));
            Self
        }
    }

    impl Drop for OverrideGuard {
        fn drop(&mut self) {
            set_config_base_override(None);
        }
    }

    #[test]
    fn paths_live_under_the_override_root() {
        let base = tempdir().unwrap();
        let _guard = OverrideGuard::set(base.path().to_path_buf());
        let root = app_root_dir().unwrap();
        assert_eq!(root, base.path().join(APP_DIR_NAME));
        assert!(root.is_dir());
        assert!(logs_dir().unwrap().is_dir());
        assert_eq!(config_file().unwrap(), root.join(CONFIG_FILE_NAME));
        assert_eq!(default_database_path().unwrap(), root.join(DATABASE_FILE_NAME));
        assert!(!root.join(CONFIG_FILE_NAME).exists());
    }
}
