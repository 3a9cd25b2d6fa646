use rusqlite::params;
use rusqlite::types::ValueRef;

use super::util::{map_sql_error, real_or_nan, table_columns};
use super::{FeatureStore, SessionRecord, StoreError};
use crate::features::{ConnectivityFeatureRow, StatisticalFeatureRow, TfrFeatureRow};

/// Feature columns returned by [`FeatureStore::joined_features`], in order.
pub const JOINED_FEATURE_COLUMNS: [&str; 22] = [
    "power_tfr_morlet",
    "power_psd_welch",
    "band_power",
    "relative_power",
    "amplitude_modulation",
    "event_related_dynamics",
    "signal_variance",
    "hjorth_activity",
    "hjorth_mobility",
    "hjorth_complexity",
    "peak_to_peak_amplitude",
    "zero_crossing_rate",
    "spectral_entropy",
    "shannon_entropy",
    "mean",
    "variance",
    "standard_deviation",
    "peak_to_peak",
    "kurtosis",
    "skewness",
    "snr",
    "spike_count",
];

/// A dynamically typed SQLite cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<ValueRef<'_>> for CellValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => CellValue::Null,
            ValueRef::Integer(v) => CellValue::Integer(v),
            ValueRef::Real(v) => CellValue::Real(v),
            ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

/// Result of the dataset join: named columns and row-major cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl JoinedTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FeatureStore {
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT session_id, participant_id, session_number, recording_filename,
                        eyes_state, cognitive_load_status
                 FROM sessions ORDER BY session_id ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(SessionRecord {
                    session_id: row.get(0)?,
                    participant_id: row.get(1)?,
                    session_number: row.get(2)?,
                    recording_filename: row.get(3)?,
                    eyes_state: row.get(4)?,
                    cognitive_load_status: row.get(5)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    pub fn session(&self, session_id: i64) -> Result<SessionRecord, StoreError> {
        self.list_sessions()?
            .into_iter()
            .find(|session| session.session_id == session_id)
            .ok_or(StoreError::UnknownSession(session_id))
    }

    pub fn statistical_rows(
        &self,
        session_id: i64,
    ) -> Result<Vec<StatisticalFeatureRow>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT session_id, recording_filename, channel, amplitude_modulation,
                        event_related_dynamics, spectral_entropy, signal_variance,
                        hjorth_activity, hjorth_mobility, hjorth_complexity,
                        peak_to_peak_amplitude, shannon_entropy, mean, variance,
                        standard_deviation, peak_to_peak, zero_crossing_rate, kurtosis,
                        skewness, snr, spike_count
                 FROM statistical_features WHERE session_id = ?1 ORDER BY id ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok(StatisticalFeatureRow {
                    session_id: row.get(0)?,
                    recording_filename: row.get(1)?,
                    channel: row.get(2)?,
                    amplitude_modulation: real_or_nan(row, 3)?,
                    event_related_dynamics: real_or_nan(row, 4)?,
                    spectral_entropy: real_or_nan(row, 5)?,
                    signal_variance: real_or_nan(row, 6)?,
                    hjorth_activity: real_or_nan(row, 7)?,
                    hjorth_mobility: real_or_nan(row, 8)?,
                    hjorth_complexity: real_or_nan(row, 9)?,
                    peak_to_peak_amplitude: real_or_nan(row, 10)?,
                    shannon_entropy: real_or_nan(row, 11)?,
                    mean: real_or_nan(row, 12)?,
                    variance: real_or_nan(row, 13)?,
                    standard_deviation: real_or_nan(row, 14)?,
                    peak_to_peak: real_or_nan(row, 15)?,
                    zero_crossing_rate: real_or_nan(row, 16)?,
                    kurtosis: real_or_nan(row, 17)?,
                    skewness: real_or_nan(row, 18)?,
                    snr: real_or_nan(row, 19)?,
                    spike_count: row.get::<_, Option<i64>>(20)?.unwrap_or(0),
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    pub fn tfr_rows(&self, session_id: i64) -> Result<Vec<TfrFeatureRow>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT session_id, recording_filename, channel, band, power_tfr_morlet,
                        power_psd_welch, power_psd_welch_normalized, band_power, relative_power
                 FROM tfr_features WHERE session_id = ?1 ORDER BY id ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok(TfrFeatureRow {
                    session_id: row.get(0)?,
                    recording_filename: row.get(1)?,
                    channel: row.get(2)?,
                    band: row.get(3)?,
                    power_tfr_morlet: real_or_nan(row, 4)?,
                    power_psd_welch: real_or_nan(row, 5)?,
                    power_psd_welch_normalized: real_or_nan(row, 6)?,
                    band_power: real_or_nan(row, 7)?,
                    relative_power: real_or_nan(row, 8)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    pub fn connectivity_rows(
        &self,
        session_id: i64,
    ) -> Result<Vec<ConnectivityFeatureRow>, StoreError> {
        let mut stmt = self
            .connection
            .prepare(
                "SELECT session_id, recording_filename, channel_1, channel_2, band, plv, coherence
                 FROM connectivity_features WHERE session_id = ?1 ORDER BY id ASC",
            )
            .map_err(map_sql_error)?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok(ConnectivityFeatureRow {
                    session_id: row.get(0)?,
                    recording_filename: row.get(1)?,
                    channel_1: row.get(2)?,
                    channel_2: row.get(3)?,
                    band: row.get(4)?,
                    plv: real_or_nan(row, 5)?,
                    coherence: real_or_nan(row, 6)?,
                })
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(rows)
    }

    /// Time-frequency rows joined to statistical rows (per session and channel)
    /// and to session metadata.
    ///
    /// The label column is selected only when `sessions` actually has it, so a
    /// misspelled label surfaces as a missing column rather than a SQL error.
    pub fn joined_features(&self, label_column: &str) -> Result<JoinedTable, StoreError> {
        let session_columns = table_columns(&self.connection, "sessions")?;
        let mut select: Vec<String> = vec![
            "tf.session_id AS session_id".into(),
            "tf.recording_filename AS recording_filename".into(),
            "tf.channel AS channel".into(),
            "tf.band AS band".into(),
        ];
        for column in JOINED_FEATURE_COLUMNS {
            let alias = if matches!(
                column,
                "power_tfr_morlet" | "power_psd_welch" | "band_power" | "relative_power"
            ) {
                "tf"
            } else {
                "sf"
            };
            select.push(format!("{alias}.{column} AS {column}"));
        }
        if session_columns.iter().any(|column| column == label_column)
            && !select_has(&select, label_column)
        {
            select.push(format!("s.\"{label_column}\" AS \"{label_column}\""));
        }
        let sql = format!(
            "SELECT {}
             FROM tfr_features AS tf
             LEFT JOIN statistical_features AS sf
                ON tf.session_id = sf.session_id AND tf.channel = sf.channel
             LEFT JOIN sessions AS s
                ON tf.session_id = s.session_id
             ORDER BY tf.id ASC",
            select.join(", ")
        );
        let mut stmt = self.connection.prepare(&sql).map_err(map_sql_error)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
        let width = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|idx| row.get_ref(idx).map(CellValue::from))
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(map_sql_error)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_sql_error)?;
        Ok(JoinedTable { columns, rows })
    }
}

fn select_has(select: &[String], column: &str) -> bool {
    select
        .iter()
        .any(|expr| expr.ends_with(&format!(" AS {column}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::NewSession;

    fn session(name: &str, status: &str) -> NewSession {
        NewSession {
            recording_filename: name.to_string(),
            cognitive_load_status: Some(status.to_string()),
            ..NewSession::default()
        }
    }

    fn tfr(session_id: i64, channel: &str, band: &str, power: f64) -> TfrFeatureRow {
        TfrFeatureRow {
            session_id,
            recording_filename: format!("s{session_id}.json"),
            channel: channel.to_string(),
            band: band.to_string(),
            power_tfr_morlet: power,
            power_psd_welch: f64::NAN,
            power_psd_welch_normalized: 0.1,
            band_power: 2.0,
            relative_power: 0.2,
        }
    }

    #[test]
    fn register_session_is_idempotent_by_filename() {
        let store = FeatureStore::open_in_memory().unwrap();
        let first = store.register_session(&session("a.json", "PRE")).unwrap();
        let again = store.register_session(&session("a.json", "POST")).unwrap();
        let second = store.register_session(&session("b.json", "PRE")).unwrap();
        assert_eq!(first, again);
        assert_ne!(first, second);
        let sessions = store.list_sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].cognitive_load_status.as_deref(), Some("POST"));
        assert!(matches!(store.session(99), Err(StoreError::UnknownSession(99))));
    }

    #[test]
    fn nan_round_trips_through_null() {
        let store = FeatureStore::open_in_memory().unwrap();
        let id = store.register_session(&session("a.json", "PRE")).unwrap();
        store
            .replace_session_features(id, &[], &[tfr(id, "Cz", "alpha", 1.5)], &[])
            .unwrap();
        let rows = store.tfr_rows(id).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].power_tfr_morlet, 1.5);
        assert!(rows[0].power_psd_welch.is_nan());
    }

    #[test]
    fn replacing_features_drops_previous_rows() {
        let store = FeatureStore::open_in_memory().unwrap();
        let id = store.register_session(&session("a.json", "PRE")).unwrap();
        let rows = [tfr(id, "Cz", "alpha", 1.0), tfr(id, "Cz", "beta", 2.0)];
        store.replace_session_features(id, &[], &rows, &[]).unwrap();
        store.replace_session_features(id, &[], &rows[..1], &[]).unwrap();
        assert_eq!(store.tfr_rows(id).unwrap().len(), 1);
    }

    #[test]
    fn join_includes_label_only_when_present() {
        let store = FeatureStore::open_in_memory().unwrap();
        let id = store.register_session(&session("a.json", "PRE")).unwrap();
        store
            .replace_session_features(id, &[], &[tfr(id, "Cz", "alpha", 1.0)], &[])
            .unwrap();
        let table = store.joined_features("cognitive_load_status").unwrap();
        assert_eq!(table.rows.len(), 1);
        let label = table.column_index("cognitive_load_status").unwrap();
        assert_eq!(table.rows[0][label], CellValue::Text("PRE".into()));
        // statistical columns are NULL without a matching statistical row
        let mean = table.column_index("mean").unwrap();
        assert_eq!(table.rows[0][mean], CellValue::Null);

        let missing = store.joined_features("workload").unwrap();
        assert!(missing.column_index("workload").is_none());
        assert_eq!(missing.columns.len(), 26);
    }
}
