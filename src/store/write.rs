use rusqlite::{OptionalExtension, Transaction, params};

use super::util::map_sql_error;
use super::{FeatureStore, NewSession, StoreError};
use crate::features::{ConnectivityFeatureRow, StatisticalFeatureRow, TfrFeatureRow};

impl FeatureStore {
    /// Insert a session, or refresh its metadata when the filename is already known.
    ///
    /// Returns the session id either way.
    pub fn register_session(&self, session: &NewSession) -> Result<i64, StoreError> {
        self.connection
            .prepare_cached(
                "INSERT INTO sessions (participant_id, session_number, recording_filename,
                                       eyes_state, cognitive_load_status)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(recording_filename) DO UPDATE SET
                    participant_id = excluded.participant_id,
                    session_number = excluded.session_number,
                    eyes_state = excluded.eyes_state,
                    cognitive_load_status = excluded.cognitive_load_status",
            )
            .map_err(map_sql_error)?
            .execute(params![
                session.participant_id,
                session.session_number,
                session.recording_filename,
                session.eyes_state,
                session.cognitive_load_status,
            ])
            .map_err(map_sql_error)?;
        self.connection
            .query_row(
                "SELECT session_id FROM sessions WHERE recording_filename = ?1",
                params![session.recording_filename],
                |row| row.get(0),
            )
            .optional()
            .map_err(map_sql_error)?
            .ok_or(StoreError::Unexpected)
    }

    /// Start a write batch that wraps related inserts in a single transaction.
    pub fn write_batch(&self) -> Result<FeatureWriteBatch<'_>, StoreError> {
        let tx = self
            .connection
            .unchecked_transaction()
            .map_err(map_sql_error)?;
        Ok(FeatureWriteBatch { tx })
    }

    /// Replace every stored feature row of one session in one transaction.
    pub fn replace_session_features(
        &self,
        session_id: i64,
        statistical: &[StatisticalFeatureRow],
        tfr: &[TfrFeatureRow],
        connectivity: &[ConnectivityFeatureRow],
    ) -> Result<(), StoreError> {
        let mut batch = self.write_batch()?;
        batch.clear_session(session_id)?;
        for row in statistical {
            batch.insert_statistical(row)?;
        }
        for row in tfr {
            batch.insert_tfr(row)?;
        }
        for row in connectivity {
            batch.insert_connectivity(row)?;
        }
        batch.commit()
    }
}

/// Groups feature inserts into one transaction using cached statements.
pub struct FeatureWriteBatch<'conn> {
    tx: Transaction<'conn>,
}

impl<'conn> FeatureWriteBatch<'conn> {
    /// Delete previously extracted rows for `session_id` from all feature tables.
    pub fn clear_session(&mut self, session_id: i64) -> Result<(), StoreError> {
        for table in ["statistical_features", "tfr_features", "connectivity_features"] {
            self.tx
                .prepare_cached(&format!("DELETE FROM {table} WHERE session_id = ?1"))
                .map_err(map_sql_error)?
                .execute(params![session_id])
                .map_err(map_sql_error)?;
        }
        Ok(())
    }

    pub fn insert_statistical(&mut self, row: &StatisticalFeatureRow) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "INSERT INTO statistical_features (
                    session_id, recording_filename, channel,
                    amplitude_modulation, event_related_dynamics, spectral_entropy,
                    signal_variance, hjorth_activity, hjorth_mobility, hjorth_complexity,
                    peak_to_peak_amplitude, shannon_entropy, mean, variance,
                    standard_deviation, peak_to_peak, zero_crossing_rate, kurtosis,
                    skewness, snr, spike_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
            )
            .map_err(map_sql_error)?
            .execute(params![
                row.session_id,
                row.recording_filename,
                row.channel,
                row.amplitude_modulation,
                row.event_related_dynamics,
                row.spectral_entropy,
                row.signal_variance,
                row.hjorth_activity,
                row.hjorth_mobility,
                row.hjorth_complexity,
                row.peak_to_peak_amplitude,
                row.shannon_entropy,
                row.mean,
                row.variance,
                row.standard_deviation,
                row.peak_to_peak,
                row.zero_crossing_rate,
                row.kurtosis,
                row.skewness,
                row.snr,
                row.spike_count,
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn insert_tfr(&mut self, row: &TfrFeatureRow) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "INSERT INTO tfr_features (
                    session_id, recording_filename, channel, band, power_tfr_morlet,
                    power_psd_welch, power_psd_welch_normalized, band_power, relative_power)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .map_err(map_sql_error)?
            .execute(params![
                row.session_id,
                row.recording_filename,
                row.channel,
                row.band,
                row.power_tfr_morlet,
                row.power_psd_welch,
                row.power_psd_welch_normalized,
                row.band_power,
                row.relative_power,
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn insert_connectivity(&mut self, row: &ConnectivityFeatureRow) -> Result<(), StoreError> {
        self.tx
            .prepare_cached(
                "INSERT INTO connectivity_features (
                    session_id, recording_filename, channel_1, channel_2, band, plv, coherence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .map_err(map_sql_error)?
            .execute(params![
                row.session_id,
                row.recording_filename,
                row.channel_1,
                row.channel_2,
                row.band,
                row.plv,
                row.coherence,
            ])
            .map_err(map_sql_error)?;
        Ok(())
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().map_err(map_sql_error)
    }
}
