use partline_sql::SQLStore;

use crate::error::ProductionError;

/// DDL for the production tables.
///
/// Each table keeps the full JSON document in `data`, with the columns
/// needed for filtering and uniqueness extracted next to it.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS configurations (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        model_number TEXT NOT NULL UNIQUE,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS production_records (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        serial_number INTEGER,
        identifier TEXT,
        configuration_id TEXT,
        create_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS serial_config_logs (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        action TEXT,
        updated_by TEXT,
        create_at TEXT
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_cfg_create ON configurations(create_at)",
    "CREATE INDEX IF NOT EXISTS idx_rec_create ON production_records(create_at)",
    "CREATE INDEX IF NOT EXISTS idx_rec_identifier ON production_records(identifier)",
    "CREATE INDEX IF NOT EXISTS idx_rec_config ON production_records(configuration_id)",
    "CREATE INDEX IF NOT EXISTS idx_serial_log_create ON serial_config_logs(create_at)",
];

/// Create tables and indexes if they do not exist.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ProductionError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])?;
    }
    Ok(())
}
