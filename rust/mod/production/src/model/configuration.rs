use serde::{Deserialize, Serialize};

use super::field::Field;

/// Width of the rendered year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum YearFormat {
    /// Two digits, e.g. `24`.
    #[default]
    Short,
    /// Four digits, e.g. `2024`.
    Full,
}

/// Configuration — a named, ordered set of fields defining one identifier.
///
/// Edits replace the whole field set; there is no partial update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: String,

    #[serde(default)]
    pub year_format: YearFormat,

    pub fields: Vec<Field>,

    pub created_at: String,

    pub updated_at: String,
}

impl Configuration {
    /// Trimmed value of the Model Number field, if present.
    pub fn model_number(&self) -> Option<&str> {
        model_number_of(&self.fields)
    }
}

/// Trimmed value of the first Model Number field in `fields`.
pub fn model_number_of(fields: &[Field]) -> Option<&str> {
    fields
        .iter()
        .find(|f| f.is_model_number())
        .map(|f| f.value.trim())
}
