use serde::{Deserialize, Serialize};

/// Quality grade of the parts currently being produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

/// The line's grade setting (KV `production:grade`). `grade` is unset
/// until an operator picks one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradeConfig {
    #[serde(default)]
    pub grade: Option<Grade>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_grade_serializes_as_null() {
        let json = serde_json::to_value(GradeConfig::default()).unwrap();
        assert_eq!(json, serde_json::json!({"grade": null}));

        let cfg: GradeConfig = serde_json::from_str(r#"{"grade": "B", "updatedBy": "qa"}"#).unwrap();
        assert_eq!(cfg.grade, Some(Grade::B));
        assert!(serde_json::from_str::<GradeConfig>(r#"{"grade": "E"}"#).is_err());
    }
}
