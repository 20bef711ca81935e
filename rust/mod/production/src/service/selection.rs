use tracing::info;

use partline_core::now_rfc3339;

use super::{Preview, ProductionService};
use crate::error::ProductionError;
use crate::model::{Configuration, Selection};

/// KV key of the operator's current selection.
pub const SELECTION_KEY: &str = "production:selection";

impl ProductionService {
    pub fn get_selection(&self) -> Result<Option<Selection>, ProductionError> {
        self.kv_get(SELECTION_KEY)
    }

    /// Load `configuration_id` on the line.
    pub fn select(
        &self,
        configuration_id: &str,
        selected_by: Option<String>,
    ) -> Result<Selection, ProductionError> {
        let config = self.configs.get(configuration_id)?;
        let selection = Selection {
            configuration_id: config.id,
            selected_by,
            selected_at: now_rfc3339(),
        };
        self.kv_put(SELECTION_KEY, &selection)?;
        info!("configuration {} selected", selection.configuration_id);
        Ok(selection)
    }

    pub(crate) fn clear_selection(&self) -> Result<(), ProductionError> {
        self.kv.delete(SELECTION_KEY)?;
        Ok(())
    }

    /// The configuration currently loaded on the line.
    pub fn selected_configuration(&self) -> Result<Configuration, ProductionError> {
        let selection = self
            .get_selection()?
            .ok_or_else(|| ProductionError::NotFound("selected configuration".into()))?;
        self.configs.get(&selection.configuration_id)
    }

    /// Identifier the next produced unit would carry.
    pub fn current_identifier(&self) -> Result<Preview, ProductionError> {
        let config = self.selected_configuration()?;
        self.preview_config(&config)
    }
}
