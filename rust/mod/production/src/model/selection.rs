use serde::{Deserialize, Serialize};

/// The configuration currently loaded on the line (KV `production:selection`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub configuration_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_by: Option<String>,

    pub selected_at: String,
}
