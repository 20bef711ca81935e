pub mod audit;
pub mod config;
pub mod record;
pub mod schema;

use serde::de::DeserializeOwned;

use partline_sql::Row;

use crate::error::ProductionError;

pub use audit::AuditLog;
pub use config::ConfigStore;
pub use record::RecordStore;
pub use schema::init_schema;

/// Decode the JSON document stored in a row's `data` column.
pub(crate) fn decode_row<T: DeserializeOwned>(row: &Row) -> Result<T, ProductionError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| ProductionError::Persistence("row has no data column".into()))?;
    Ok(serde_json::from_str(data)?)
}

/// Decode every row of a result set.
pub(crate) fn decode_rows<T: DeserializeOwned>(rows: &[Row]) -> Result<Vec<T>, ProductionError> {
    rows.iter().map(decode_row).collect()
}

/// Read a `COUNT(*) AS n` result.
pub(crate) fn count_of(rows: &[Row]) -> usize {
    rows.first()
        .and_then(|r| r.get_i64("n"))
        .map(|n| n.max(0) as usize)
        .unwrap_or(0)
}
