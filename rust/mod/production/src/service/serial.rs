use tracing::error;

use partline_core::{new_id, now_rfc3339, ListParams, ListResult};

use super::ProductionService;
use crate::error::ProductionError;
use crate::model::{SerialAction, SerialConfigLog, SerialCounterState, SerialSettings};

impl ProductionService {
    /// Counter state, after applying a reset that has come due.
    pub fn serial_config(&self) -> SerialCounterState {
        self.counter.peek();
        self.counter.state()
    }

    pub fn set_serial_config(
        &self,
        settings: SerialSettings,
        updated_by: Option<String>,
    ) -> Result<SerialCounterState, ProductionError> {
        let state = self.counter.configure(&settings, updated_by.clone())?;
        self.log_serial_change(SerialAction::Configure, &settings, updated_by);
        Ok(state)
    }

    /// Restart the sequence. Without `settings`, the stored parameters are reused.
    pub fn manual_reset(
        &self,
        settings: Option<SerialSettings>,
        updated_by: Option<String>,
    ) -> Result<SerialCounterState, ProductionError> {
        let settings = settings.unwrap_or_else(|| {
            let current = self.counter.state();
            SerialSettings {
                initial_value: current.initial_value,
                reset_value: current.reset_value,
                reset_time: current.reset_time,
            }
        });
        let state = self.counter.manual_reset(&settings, updated_by.clone())?;
        self.log_serial_change(SerialAction::ManualReset, &settings, updated_by);
        Ok(state)
    }

    pub fn serial_logs(&self, params: &ListParams) -> Result<ListResult<SerialConfigLog>, ProductionError> {
        self.audit.list(params)
    }

    /// The counter change is already durable here; a lost audit row is logged, not surfaced.
    fn log_serial_change(&self, action: SerialAction, settings: &SerialSettings, updated_by: Option<String>) {
        let entry = SerialConfigLog {
            id: new_id(),
            action,
            initial_value: settings.initial_value,
            reset_value: settings.reset_value,
            reset_time: settings.reset_time,
            updated_by,
            created_at: now_rfc3339(),
        };
        if let Err(e) = self.audit.append(&entry) {
            error!("failed to record serial {action:?} in audit log: {e}");
        }
    }
}
