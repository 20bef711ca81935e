use std::sync::Arc;

use tracing::{info, warn};

use partline_core::{new_id, now_rfc3339};
use partline_sql::{SQLError, SQLStore, Value};

use super::{decode_row, decode_rows};
use crate::error::ProductionError;
use crate::ident::validate_definition;
use crate::model::{model_number_of, Configuration, Field, FieldKind, YearFormat, MODEL_NUMBER};

/// ConfigStore — persisted configurations with a globally unique Model Number.
pub struct ConfigStore {
    sql: Arc<dyn SQLStore>,
}

impl ConfigStore {
    pub fn new(sql: Arc<dyn SQLStore>) -> Self {
        Self { sql }
    }

    /// All configurations, newest first.
    pub fn list(&self) -> Result<Vec<Configuration>, ProductionError> {
        let rows = self.sql.query(
            "SELECT data FROM configurations ORDER BY create_at DESC, rowid DESC",
            &[],
        )?;
        decode_rows(&rows)
    }

    pub fn get(&self, id: &str) -> Result<Configuration, ProductionError> {
        let rows = self.sql.query(
            "SELECT data FROM configurations WHERE id = ?1",
            &[Value::Text(id.to_string())],
        )?;
        match rows.first() {
            Some(row) => decode_row(row),
            None => Err(ProductionError::NotFound(format!("configuration '{id}'"))),
        }
    }

    /// Id of the configuration owning `model_number`, ignoring `excluding`.
    pub fn find_by_model_number(
        &self,
        model_number: &str,
        excluding: Option<&str>,
    ) -> Result<Option<String>, ProductionError> {
        let rows = self.sql.query(
            "SELECT id FROM configurations WHERE model_number = ?1 AND id != ?2",
            &[
                Value::Text(model_number.to_string()),
                Value::Text(excluding.unwrap_or_default().to_string()),
            ],
        )?;
        Ok(rows
            .first()
            .and_then(|r| r.get_str("id"))
            .map(str::to_string))
    }

    pub fn create(
        &self,
        fields: Vec<Field>,
        year_format: YearFormat,
    ) -> Result<Configuration, ProductionError> {
        let fields = normalize(fields);
        let model_number = checked_model_number(&fields)?;
        self.ensure_unique(&model_number, None)?;

        let now = now_rfc3339();
        let config = Configuration {
            id: new_id(),
            year_format,
            fields,
            created_at: now.clone(),
            updated_at: now,
        };

        self.sql
            .exec(
                "INSERT INTO configurations (id, data, model_number, create_at, update_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                &[
                    Value::Text(config.id.clone()),
                    Value::Text(serde_json::to_string(&config)?),
                    Value::Text(model_number.clone()),
                    Value::Text(config.created_at.clone()),
                    Value::Text(config.updated_at.clone()),
                ],
            )
            .map_err(|e| self.write_error(e, &model_number, None))?;

        info!("configuration {} created (model number '{model_number}')", config.id);
        Ok(config)
    }

    /// Replace the whole field set of an existing configuration.
    pub fn update(
        &self,
        id: &str,
        fields: Vec<Field>,
        year_format: YearFormat,
    ) -> Result<Configuration, ProductionError> {
        let current = self.get(id)?;
        let fields = normalize(fields);
        let model_number = checked_model_number(&fields)?;
        self.ensure_unique(&model_number, Some(id))?;

        let updated = Configuration {
            fields,
            year_format,
            updated_at: now_rfc3339(),
            ..current
        };

        let affected = self
            .sql
            .exec(
                "UPDATE configurations SET data = ?1, model_number = ?2, update_at = ?3 WHERE id = ?4",
                &[
                    Value::Text(serde_json::to_string(&updated)?),
                    Value::Text(model_number.clone()),
                    Value::Text(updated.updated_at.clone()),
                    Value::Text(id.to_string()),
                ],
            )
            .map_err(|e| self.write_error(e, &model_number, Some(id)))?;
        if affected == 0 {
            return Err(ProductionError::NotFound(format!("configuration '{id}'")));
        }

        info!("configuration {id} updated (model number '{model_number}')");
        Ok(updated)
    }

    pub fn delete(&self, id: &str) -> Result<(), ProductionError> {
        let affected = self.sql.exec(
            "DELETE FROM configurations WHERE id = ?1",
            &[Value::Text(id.to_string())],
        )?;
        if affected == 0 {
            return Err(ProductionError::NotFound(format!("configuration '{id}'")));
        }
        info!("configuration {id} deleted");
        Ok(())
    }

    fn ensure_unique(&self, model_number: &str, excluding: Option<&str>) -> Result<(), ProductionError> {
        match self.find_by_model_number(model_number, excluding)? {
            Some(conflicting_id) => Err(ProductionError::DuplicateModelNumber {
                model_number: model_number.to_string(),
                conflicting_id,
            }),
            None => Ok(()),
        }
    }

    /// A write lost the race to the UNIQUE index: report who owns the number now.
    fn write_error(&self, err: SQLError, model_number: &str, excluding: Option<&str>) -> ProductionError {
        let msg = match err {
            SQLError::UniqueViolation(msg) => msg,
            other => return other.into(),
        };
        warn!("model number '{model_number}' taken concurrently: {msg}");
        match self.find_by_model_number(model_number, excluding) {
            Ok(Some(conflicting_id)) => ProductionError::DuplicateModelNumber {
                model_number: model_number.to_string(),
                conflicting_id,
            },
            Ok(None) => ProductionError::Persistence(msg),
            Err(e) => e,
        }
    }
}

/// Model Number is always a required static field; names are stored trimmed.
fn normalize(fields: Vec<Field>) -> Vec<Field> {
    fields
        .into_iter()
        .map(|mut f| {
            f.name = f.name.trim().to_string();
            if f.is_model_number() {
                f.is_required = true;
                f.kind = FieldKind::Static;
            }
            f
        })
        .collect()
}

fn checked_model_number(fields: &[Field]) -> Result<String, ProductionError> {
    validate_definition(fields)?;
    model_number_of(fields)
        .map(str::to_string)
        .ok_or_else(|| ProductionError::validation("a Model Number field is required", vec![MODEL_NUMBER.into()]))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::store::init_schema;
    use partline_sql::{Row, SqliteStore};

    fn store() -> ConfigStore {
        let sql = SqliteStore::open_in_memory().unwrap();
        init_schema(&sql).unwrap();
        ConfigStore::new(Arc::new(sql))
    }

    fn fields(model_number: &str, part: &str) -> Vec<Field> {
        vec![
            Field {
                value: model_number.into(),
                ..Field::new(MODEL_NUMBER, FieldKind::Static)
            },
            Field {
                value: part.into(),
                is_checked: true,
                order: 1,
                ..Field::new("Part Number", FieldKind::Static)
            },
        ]
    }

    #[test]
    fn create_get_list() {
        let store = store();
        let a = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        let b = store.create(fields("MN-2", "P2"), YearFormat::Full).unwrap();

        let got = store.get(&a.id).unwrap();
        assert_eq!(got, a);
        assert!(got.fields[0].is_required);

        let ids: Vec<String> = store.list().unwrap().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
    }

    #[test]
    fn duplicate_model_number_is_rejected() {
        let store = store();
        let first = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        let err = store.create(fields("  MN-1 ", "P2"), YearFormat::Short).unwrap_err();
        assert_eq!(
            err,
            ProductionError::DuplicateModelNumber {
                model_number: "MN-1".into(),
                conflicting_id: first.id,
            }
        );
        assert_eq!(store.list().unwrap().len(), 1);

        assert!(store.create(fields("mn-1", "P3"), YearFormat::Short).is_ok());
    }

    #[test]
    fn update_keeping_own_model_number_succeeds() {
        let store = store();
        let cfg = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        let updated = store.update(&cfg.id, fields("MN-1", "P9"), YearFormat::Full).unwrap();
        assert_eq!(updated.created_at, cfg.created_at);
        assert_eq!(updated.year_format, YearFormat::Full);
        assert_eq!(store.get(&cfg.id).unwrap().fields[1].value, "P9");
    }

    #[test]
    fn update_into_taken_model_number_is_rejected() {
        let store = store();
        let a = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        let b = store.create(fields("MN-2", "P2"), YearFormat::Short).unwrap();
        match store.update(&b.id, fields("MN-1", "P2"), YearFormat::Short).unwrap_err() {
            ProductionError::DuplicateModelNumber { conflicting_id, .. } => assert_eq!(conflicting_id, a.id),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn invalid_fields_are_rejected_before_writing() {
        let store = store();
        let mut bad = fields("MN-1", "P1");
        bad.push(Field {
            value: "X".into(),
            is_checked: true,
            order: 1,
            ..Field::new("Line", FieldKind::Static)
        });
        assert!(matches!(
            store.create(bad, YearFormat::Short).unwrap_err(),
            ProductionError::Validation { .. }
        ));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = store();
        assert!(matches!(store.get("nope"), Err(ProductionError::NotFound(_))));
        assert!(matches!(store.delete("nope"), Err(ProductionError::NotFound(_))));
        assert!(matches!(
            store.update("nope", fields("MN", "P"), YearFormat::Short),
            Err(ProductionError::NotFound(_))
        ));
    }

    #[test]
    fn model_number_is_always_static() {
        let store = store();
        let mut derived = fields("MN-1", "P1");
        derived[0].kind = FieldKind::DerivedSerial;
        let cfg = store.create(derived, YearFormat::Short).unwrap();
        assert_eq!(cfg.fields[0].kind, FieldKind::Static);
        assert_eq!(store.get(&cfg.id).unwrap().model_number(), Some("MN-1"));

        let mut derived = fields("MN-1", "P2");
        derived[0].kind = FieldKind::DerivedYear;
        let updated = store.update(&cfg.id, derived, YearFormat::Short).unwrap();
        assert_eq!(updated.fields[0].kind, FieldKind::Static);
    }

    #[test]
    fn delete_frees_the_model_number() {
        let store = store();
        let cfg = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        store.delete(&cfg.id).unwrap();
        assert!(store.get(&cfg.id).is_err());
        assert!(store.create(fields("MN-1", "P1"), YearFormat::Short).is_ok());
    }

    /// Hides the first uniqueness lookup, as if another writer won the race.
    struct RacingSql {
        inner: SqliteStore,
        spent: AtomicBool,
    }

    impl SQLStore for RacingSql {
        fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
            if sql.contains("model_number = ?1") && !self.spent.swap(true, Ordering::SeqCst) {
                return Ok(Vec::new());
            }
            self.inner.query(sql, params)
        }

        fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
            self.inner.exec(sql, params)
        }
    }

    #[test]
    fn unique_index_conflict_maps_to_duplicate() {
        let inner = SqliteStore::open_in_memory().unwrap();
        init_schema(&inner).unwrap();
        let racing = Arc::new(RacingSql { inner, spent: AtomicBool::new(true) });
        let store = ConfigStore::new(racing.clone());

        let winner = store.create(fields("MN-1", "P1"), YearFormat::Short).unwrap();
        racing.spent.store(false, Ordering::SeqCst);

        match store.create(fields("MN-1", "P2"), YearFormat::Short).unwrap_err() {
            ProductionError::DuplicateModelNumber { conflicting_id, .. } => {
                assert_eq!(conflicting_id, winner.id)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
