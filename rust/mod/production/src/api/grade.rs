use axum::{extract::State, http::HeaderMap, routing::get, Json, Router};
use serde::Deserialize;

use super::{ok_json, operator, ApiError, AppState};
use crate::model::{Grade, GradeConfig};

pub fn routes() -> Router<AppState> {
    Router::new().route("/grade", get(get_grade).put(set_grade))
}

#[derive(Deserialize)]
struct GradeBody {
    #[serde(default)]
    grade: Option<Grade>,
}

async fn get_grade(State(svc): State<AppState>) -> Result<Json<GradeConfig>, ApiError> {
    ok_json(svc.get_grade())
}

async fn set_grade(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<GradeBody>,
) -> Result<Json<GradeConfig>, ApiError> {
    ok_json(svc.set_grade(body.grade, operator(&headers)))
}
