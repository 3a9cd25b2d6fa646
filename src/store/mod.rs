//! SQLite persistence for sessions and extracted feature rows.
//!
//! The store is a single-writer resource: the extraction driver collects
//! results from its workers and writes them here from one thread.

mod read;
mod schema;
mod util;
mod write;

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use read::{CellValue, JoinedTable};
pub use write::FeatureWriteBatch;

use util::map_sql_error;

/// Errors returned by the feature store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("Could not create database directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Database is busy, please retry")]
    Busy,
    #[error("SQLite returned an unexpected result")]
    Unexpected,
    #[error("Unknown session {0}")]
    UnknownSession(i64),
}

/// Session metadata supplied when a recording is registered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub participant_id: Option<i64>,
    pub session_number: Option<i64>,
    pub recording_filename: String,
    /// `O` or `C` for eyes open/closed.
    pub eyes_state: Option<String>,
    /// `PRE` or `POST`; validated only when the dataset is loaded.
    pub cognitive_load_status: Option<String>,
}

/// A registered session row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: i64,
    pub participant_id: Option<i64>,
    pub session_number: Option<i64>,
    pub recording_filename: String,
    pub eyes_state: Option<String>,
    pub cognitive_load_status: Option<String>,
}

/// SQLite database holding `sessions` and the three feature tables.
pub struct FeatureStore {
    connection: Connection,
    path: Option<PathBuf>,
}

impl FeatureStore {
    /// Open (or create) the database file and apply the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let connection = Connection::open(path)?;
        let store = Self {
            connection,
            path: Some(path.to_path_buf()),
        };
        store.apply_pragmas()?;
        schema::apply_schema(&store.connection)?;
        Ok(store)
    }

    /// Private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self {
            connection: Connection::open_in_memory()?,
            path: None,
        };
        schema::apply_schema(&store.connection)?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn apply_pragmas(&self) -> Result<(), StoreError> {
        self.connection
            .execute_batch(
                "PRAGMA journal_mode=WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;
             PRAGMA temp_store=MEMORY;",
            )
            .map_err(map_sql_error)?;
        Ok(())
    }
}
