use tracing::info;

use partline_core::now_rfc3339;

use super::ProductionService;
use crate::error::ProductionError;
use crate::model::{Grade, GradeConfig};

/// KV key of the grade setting.
pub const GRADE_KEY: &str = "production:grade";

impl ProductionService {
    pub fn get_grade(&self) -> Result<GradeConfig, ProductionError> {
        Ok(self.kv_get(GRADE_KEY)?.unwrap_or_default())
    }

    /// Replace the grade; `None` clears it.
    pub fn set_grade(
        &self,
        grade: Option<Grade>,
        updated_by: Option<String>,
    ) -> Result<GradeConfig, ProductionError> {
        let config = GradeConfig {
            grade,
            updated_at: Some(now_rfc3339()),
            updated_by,
        };
        self.kv_put(GRADE_KEY, &config)?;
        info!("grade set to {:?}", config.grade);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::harness;

    #[test]
    fn grade_is_unset_until_saved() {
        let h = harness("2024-03-01 08:00");
        assert_eq!(h.svc.get_grade().unwrap(), GradeConfig::default());

        let saved = h.svc.set_grade(Some(Grade::C), Some("qa@line".into())).unwrap();
        assert!(saved.updated_at.is_some());
        assert_eq!(h.svc.get_grade().unwrap(), saved);

        let cleared = h.svc.set_grade(None, None).unwrap();
        assert_eq!(cleared.grade, None);
        assert_eq!(h.svc.get_grade().unwrap().updated_by, None);
    }

    #[test]
    fn failed_write_keeps_previous_grade() {
        let h = harness("2024-03-01 08:00");
        h.svc.set_grade(Some(Grade::A), None).unwrap();
        h.kv.fail_next(1);
        assert!(matches!(
            h.svc.set_grade(Some(Grade::D), None),
            Err(ProductionError::Persistence(_))
        ));
        assert_eq!(h.svc.get_grade().unwrap().grade, Some(Grade::A));
    }
}
