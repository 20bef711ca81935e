use std::sync::Arc;

use partline_core::{ListParams, ListResult};
use partline_sql::{SQLStore, Value};

use super::{count_of, decode_row, decode_rows};
use crate::error::ProductionError;
use crate::model::ProductionRecord;

/// RecordStore — one row per marked unit.
pub struct RecordStore {
    sql: Arc<dyn SQLStore>,
}

impl RecordStore {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }

    pub fn insert(&self, record: &ProductionRecord) -> Result<(), ProductionError> {
        self.sql.exec(
            "INSERT INTO production_records (id, data, serial_number, identifier, configuration_id, create_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            &[
                Value::Text(record.id.clone()),
                Value::Text(serde_json::to_string(record)?),
                Value::Integer(i64::try_from(record.serial_number).unwrap_or(i64::MAX)),
                Value::Text(record.identifier.clone()),
                Value::from(record.configuration_id.clone()),
                Value::Text(record.created_at.clone()),
            ],
        )?;
        Ok(())
    }

    /// Most recently inserted record.
    pub fn latest(&self) -> Result<Option<ProductionRecord>, ProductionError> {
        let rows = self.sql.query(
            "SELECT data FROM production_records ORDER BY rowid DESC LIMIT 1",
            &[],
        )?;
        rows.first().map(decode_row).transpose()
    }

    /// Records newest first.
    pub fn list(&self, params: &ListParams) -> Result<ListResult<ProductionRecord>, ProductionError> {
        let limit = params.limit.min(500);
        let rows = self.sql.query(
            "SELECT data FROM production_records ORDER BY rowid DESC LIMIT ?1 OFFSET ?2",
            &[Value::Integer(limit as i64), Value::Integer(params.offset as i64)],
        )?;
        let total = count_of(&self.sql.query("SELECT COUNT(*) AS n FROM production_records", &[])?);
        Ok(ListResult {
            items: decode_rows(&rows)?,
            total,
        })
    }
}
