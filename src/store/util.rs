use rusqlite::Connection;

use super::StoreError;

/// Translate rusqlite errors into friendlier StoreError variants.
pub(super) fn map_sql_error(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(sql_err, _)
            if sql_err.extended_code == rusqlite::ffi::SQLITE_BUSY =>
        {
            StoreError::Busy
        }
        rusqlite::Error::InvalidQuery
        | rusqlite::Error::InvalidParameterName(_)
        | rusqlite::Error::MultipleStatement => StoreError::Unexpected,
        other => StoreError::Sql(other),
    }
}

/// Column names of `table`, in declaration order.
pub(super) fn table_columns(
    connection: &Connection,
    table: &str,
) -> Result<Vec<String>, StoreError> {
    let mut stmt = connection
        .prepare(&format!("PRAGMA table_info({table})"))
        .map_err(map_sql_error)?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(map_sql_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_sql_error)?;
    Ok(columns)
}

/// NULL-tolerant read of a REAL column; SQLite stores NaN as NULL.
pub(super) fn real_or_nan(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<f64> {
    Ok(row.get::<_, Option<f64>>(idx)?.unwrap_or(f64::NAN))
}
