use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use partline_core::now_rfc3339;

use super::ProductionService;
use crate::error::ProductionError;
use crate::ident::{resolve_shift, validate_shift_table};
use crate::model::{ShiftDefinition, ShiftSchedule};

/// KV key of the shift table.
pub const SHIFTS_KEY: &str = "production:shifts";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrentShift {
    /// Active shift label, empty when no shift covers the instant.
    pub label: String,
    pub at: NaiveDateTime,
}

impl ProductionService {
    /// The stored shift table; empty until one is saved.
    pub fn get_shifts(&self) -> Result<ShiftSchedule, ProductionError> {
        Ok(self.kv_get(SHIFTS_KEY)?.unwrap_or_default())
    }

    pub fn set_shifts(&self, shifts: Vec<ShiftDefinition>) -> Result<ShiftSchedule, ProductionError> {
        validate_shift_table(&shifts)?;
        let schedule = ShiftSchedule {
            shifts,
            updated_at: Some(now_rfc3339()),
        };
        self.kv_put(SHIFTS_KEY, &schedule)?;
        info!("shift table saved ({} shifts)", schedule.shifts.len());
        Ok(schedule)
    }

    pub fn current_shift(&self) -> Result<CurrentShift, ProductionError> {
        let at = self.counter.now();
        let schedule = self.get_shifts()?;
        Ok(CurrentShift {
            label: resolve_shift(at.time(), &schedule.shifts).to_string(),
            at,
        })
    }
}
