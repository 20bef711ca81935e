use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use super::ProductionService;
use crate::error::ProductionError;
use crate::ident::{render_fields, DeriveContext};
use crate::model::{default_fields, Configuration, Field, YearFormat};

/// What a configuration would print right now, without consuming a serial.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub configuration_id: String,
    pub identifier: String,
    pub serial_number: u64,
    pub at: NaiveDateTime,
    /// Fields with derived values filled in.
    pub fields: Vec<Field>,
}

impl ProductionService {
    pub fn list_configs(&self) -> Result<Vec<Configuration>, ProductionError> {
        self.configs.list()
    }

    pub fn get_config(&self, id: &str) -> Result<Configuration, ProductionError> {
        self.configs.get(id)
    }

    pub fn create_config(
        &self,
        fields: Vec<Field>,
        year_format: YearFormat,
    ) -> Result<Configuration, ProductionError> {
        self.configs.create(fields, year_format)
    }

    pub fn update_config(
        &self,
        id: &str,
        fields: Vec<Field>,
        year_format: YearFormat,
    ) -> Result<Configuration, ProductionError> {
        self.configs.update(id, fields, year_format)
    }

    /// Delete a configuration, unloading it from the line if selected.
    pub fn delete_config(&self, id: &str) -> Result<(), ProductionError> {
        self.configs.delete(id)?;
        if self
            .get_selection()?
            .is_some_and(|s| s.configuration_id == id)
        {
            self.clear_selection()?;
            info!("selection cleared, configuration {id} was deleted");
        }
        Ok(())
    }

    /// Blank field set for a new configuration form.
    pub fn config_template(&self) -> Vec<Field> {
        default_fields()
    }

    pub fn preview(&self, id: &str) -> Result<Preview, ProductionError> {
        let config = self.configs.get(id)?;
        self.preview_config(&config)
    }

    pub(crate) fn preview_config(&self, config: &Configuration) -> Result<Preview, ProductionError> {
        let serial = self.counter.peek();
        let at = self.counter.now();
        let schedule = self.get_shifts()?;
        let ctx = DeriveContext {
            at,
            shifts: &schedule.shifts,
            serial,
            year_format: config.year_format,
        };
        let (identifier, fields) = render_fields(config, &ctx)?;
        Ok(Preview {
            configuration_id: config.id.clone(),
            identifier,
            serial_number: serial,
            at,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SerialSettings;
    use crate::service::testing::{harness, line_fields};

    #[test]
    fn preview_does_not_consume_serial() {
        let h = harness("2024-03-01 08:00");
        h.svc
            .set_serial_config(
                SerialSettings {
                    initial_value: 1,
                    reset_value: 12,
                    reset_time: "00:00".parse().unwrap(),
                },
                None,
            )
            .unwrap();
        let cfg = h.svc.create_config(line_fields("MN-1"), YearFormat::Short).unwrap();

        let first = h.svc.preview(&cfg.id).unwrap();
        assert_eq!(first.identifier, "P70610012");
        assert_eq!(first.serial_number, 12);
        assert_eq!(h.svc.preview(&cfg.id).unwrap(), first);
        assert_eq!(h.svc.counter().peek(), 12);
    }

    #[test]
    fn template_is_offered() {
        let h = harness("2024-03-01 08:00");
        assert!(h.svc.config_template().iter().any(|f| f.is_model_number()));
    }

    #[test]
    fn preview_surfaces_validation_errors() {
        let h = harness("2024-03-01 08:00");
        let mut fields = line_fields("MN-1");
        fields.push(Field {
            is_checked: true,
            order: 4,
            ..Field::new("Shift", crate::model::FieldKind::DerivedShift)
        });
        let cfg = h.svc.create_config(fields, YearFormat::Short).unwrap();
        match h.svc.preview(&cfg.id).unwrap_err() {
            ProductionError::Validation { fields, .. } => assert_eq!(fields, vec!["Shift"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
