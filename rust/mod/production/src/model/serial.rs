use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::TimeOfDay;

/// SerialCounterState — the persisted counter singleton (`production:serial`).
///
/// `last_reset_date` is the idempotency key of the daily reset: the reset
/// fires at most once per calendar date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerialCounterState {
    #[serde(default)]
    pub current_value: u64,

    #[serde(default)]
    pub initial_value: u64,

    #[serde(default)]
    pub reset_value: u64,

    #[serde(default)]
    pub reset_time: TimeOfDay,

    #[serde(default)]
    pub last_reset_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// Operator-editable counter parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerialSettings {
    pub initial_value: u64,
    pub reset_value: u64,
    pub reset_time: TimeOfDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerialAction {
    Configure,
    ManualReset,
}

/// Append-only audit row for serial parameter changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerialConfigLog {
    pub id: String,
    pub action: SerialAction,
    pub initial_value: u64,
    pub reset_value: u64,
    pub reset_time: TimeOfDay,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,

    pub created_at: String,
}
