use partline_core::ServiceError;
use partline_kv::KVError;
use partline_sql::SQLError;
use thiserror::Error;

/// Errors raised by the production engine.
///
/// `Validation` is client-fixable and always names the offending fields.
/// `DuplicateModelNumber` carries the id of the configuration that already
/// owns the model number. `Persistence` is surfaced only after local retries.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProductionError {
    #[error("{reason}")]
    Validation { reason: String, fields: Vec<String> },

    #[error("model number '{model_number}' is already used by configuration {conflicting_id}")]
    DuplicateModelNumber {
        model_number: String,
        conflicting_id: String,
    },

    #[error("persistence failed: {0}")]
    Persistence(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl ProductionError {
    pub fn validation(reason: impl Into<String>, fields: Vec<String>) -> Self {
        ProductionError::Validation {
            reason: reason.into(),
            fields,
        }
    }

    /// Structured details for API clients, if the variant has any.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ProductionError::Validation { fields, .. } => {
                Some(serde_json::json!({ "fields": fields }))
            }
            ProductionError::DuplicateModelNumber {
                model_number,
                conflicting_id,
            } => Some(serde_json::json!({
                "modelNumber": model_number,
                "conflictingId": conflicting_id,
            })),
            _ => None,
        }
    }
}

impl From<ProductionError> for ServiceError {
    fn from(err: ProductionError) -> Self {
        let msg = err.to_string();
        match err {
            ProductionError::Validation { .. } => ServiceError::Validation(msg),
            ProductionError::DuplicateModelNumber { .. } => ServiceError::Conflict(msg),
            ProductionError::Persistence(_) => ServiceError::Storage(msg),
            ProductionError::NotFound(_) => ServiceError::NotFound(msg),
        }
    }
}

impl From<KVError> for ProductionError {
    fn from(err: KVError) -> Self {
        ProductionError::Persistence(err.to_string())
    }
}

impl From<SQLError> for ProductionError {
    fn from(err: SQLError) -> Self {
        ProductionError::Persistence(err.to_string())
    }
}

impl From<serde_json::Error> for ProductionError {
    fn from(err: serde_json::Error) -> Self {
        ProductionError::Persistence(format!("bad stored json: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_to_service_error_codes() {
        let dup = ProductionError::DuplicateModelNumber {
            model_number: "MN-1".into(),
            conflicting_id: "abc".into(),
        };
        assert_eq!(ServiceError::from(dup.clone()).error_code(), "ALREADY_EXISTS");
        assert_eq!(dup.details().unwrap()["conflictingId"], "abc");

        let invalid = ProductionError::validation("bad order", vec!["Year".into()]);
        assert_eq!(ServiceError::from(invalid.clone()).error_code(), "VALIDATION_FAILED");
        assert_eq!(invalid.details().unwrap()["fields"][0], "Year");

        let gone = ProductionError::NotFound("configuration x".into());
        assert_eq!(ServiceError::from(gone.clone()).to_string(), "configuration x not found");
        assert!(gone.details().is_none());

        let io = ProductionError::from(KVError::Storage("disk full".into()));
        assert_eq!(ServiceError::from(io).error_code(), "STORAGE_ERROR");
    }
}
