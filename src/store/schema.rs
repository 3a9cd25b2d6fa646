use rusqlite::Connection;

use super::StoreError;
use super::util::map_sql_error;

pub(super) fn apply_schema(connection: &Connection) -> Result<(), StoreError> {
    connection
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id INTEGER PRIMARY KEY AUTOINCREMENT,
                participant_id INTEGER,
                session_number INTEGER,
                recording_filename TEXT NOT NULL UNIQUE,
                eyes_state TEXT,
                cognitive_load_status TEXT
             );
             CREATE TABLE IF NOT EXISTS tfr_features (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                recording_filename TEXT NOT NULL,
                channel TEXT NOT NULL,
                band TEXT NOT NULL,
                power_tfr_morlet REAL,
                power_psd_welch REAL,
                power_psd_welch_normalized REAL,
                band_power REAL,
                relative_power REAL,
                FOREIGN KEY (session_id) REFERENCES sessions(session_id)
             );
             CREATE TABLE IF NOT EXISTS statistical_features (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                recording_filename TEXT NOT NULL,
                channel TEXT NOT NULL,
                amplitude_modulation REAL,
                event_related_dynamics REAL,
                spectral_entropy REAL,
                signal_variance REAL,
                hjorth_activity REAL,
                hjorth_mobility REAL,
                hjorth_complexity REAL,
                peak_to_peak_amplitude REAL,
                shannon_entropy REAL,
                mean REAL,
                variance REAL,
                standard_deviation REAL,
                peak_to_peak REAL,
                zero_crossing_rate REAL,
                kurtosis REAL,
                skewness REAL,
                snr REAL,
                spike_count INTEGER,
                FOREIGN KEY (session_id) REFERENCES sessions(session_id)
             );
             CREATE TABLE IF NOT EXISTS connectivity_features (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id INTEGER NOT NULL,
                recording_filename TEXT NOT NULL,
                channel_1 TEXT NOT NULL,
                channel_2 TEXT NOT NULL,
                band TEXT NOT NULL,
                plv REAL,
                coherence REAL,
                FOREIGN KEY (session_id) REFERENCES sessions(session_id)
             );
             CREATE INDEX IF NOT EXISTS idx_tfr_features_session_channel
                ON tfr_features (session_id, channel);
             CREATE INDEX IF NOT EXISTS idx_statistical_features_session_channel
                ON statistical_features (session_id, channel);
             CREATE INDEX IF NOT EXISTS idx_connectivity_features_session
                ON connectivity_features (session_id);",
        )
        .map_err(map_sql_error)?;
    Ok(())
}
