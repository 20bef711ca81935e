use serde::{Deserialize, Serialize};

use super::time::TimeOfDay;

/// A named time-of-day window. `end < start` wraps past midnight.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftDefinition {
    pub label: String,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl ShiftDefinition {
    pub fn new(label: impl Into<String>, start_time: TimeOfDay, end_time: TimeOfDay) -> Self {
        Self {
            label: label.into(),
            start_time,
            end_time,
        }
    }

    /// Length of the shift in minutes.
    pub fn duration_minutes(&self) -> u16 {
        self.start_time.minutes_until(self.end_time)
    }
}

/// The persisted shift table (KV record `production:shifts`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSchedule {
    pub shifts: Vec<ShiftDefinition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
