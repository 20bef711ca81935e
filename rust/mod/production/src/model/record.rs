use serde::{Deserialize, Serialize};

/// ProductionRecord — one marked unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    pub id: String,
    pub serial_number: u64,
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_number: Option<String>,

    /// Raw telemetry payload that triggered the record.
    #[serde(default)]
    pub data: serde_json::Value,

    pub created_at: String,
}
