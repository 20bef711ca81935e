use std::sync::Arc;

use partline_core::{ListParams, ListResult};
use partline_sql::{SQLStore, Value};

use super::{count_of, decode_rows};
use crate::error::ProductionError;
use crate::model::{SerialAction, SerialConfigLog};

/// Append-only log of serial parameter changes.
pub struct AuditLog {
    sql: Arc<dyn SQLStore>,
}

impl AuditLog {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }

    pub fn append(&self, entry: &SerialConfigLog) -> Result<(), ProductionError> {
        let action = match entry.action {
            SerialAction::Configure => "configure",
            SerialAction::ManualReset => "manual_reset",
        };
        self.sql.exec(
            "INSERT INTO serial_config_logs (id, data, action, updated_by, create_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            &[
                Value::Text(entry.id.clone()),
                Value::Text(serde_json::to_string(entry)?),
                Value::Text(action.to_string()),
                Value::from(entry.updated_by.clone()),
                Value::Text(entry.created_at.clone()),
            ],
        )?;
        Ok(())
    }

    /// Entries newest first.
    pub fn list(&self, params: &ListParams) -> Result<ListResult<SerialConfigLog>, ProductionError> {
        let limit = params.limit.min(500);
        let rows = self.sql.query(
            "SELECT data FROM serial_config_logs ORDER BY rowid DESC LIMIT ?1 OFFSET ?2",
            &[Value::Integer(limit as i64), Value::Integer(params.offset as i64)],
        )?;
        let total = count_of(&self.sql.query("SELECT COUNT(*) AS n FROM serial_config_logs", &[])?);
        Ok(ListResult {
            items: decode_rows(&rows)?,
            total,
        })
    }
}
