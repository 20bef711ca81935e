use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};

use partline_core::{ListParams, ListResult};

use super::{blocking, ok_json, operator, ApiError, AppState};
use crate::model::{SerialConfigLog, SerialCounterState, SerialSettings};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/serial", get(get_serial).put(set_serial))
        .route("/serial/reset", post(reset_serial))
        .route("/serial/logs", get(serial_logs))
}

async fn get_serial(State(svc): State<AppState>) -> Result<Json<SerialCounterState>, ApiError> {
    blocking(svc, |svc| Ok(svc.serial_config())).await
}

async fn set_serial(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(settings): Json<SerialSettings>,
) -> Result<Json<SerialCounterState>, ApiError> {
    let by = operator(&headers);
    blocking(svc, move |svc| svc.set_serial_config(settings, by)).await
}

/// Body is optional; without one the stored parameters are reused.
async fn reset_serial(
    State(svc): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<SerialSettings>>,
) -> Result<Json<SerialCounterState>, ApiError> {
    let settings = body.map(|Json(s)| s);
    let by = operator(&headers);
    blocking(svc, move |svc| svc.manual_reset(settings, by)).await
}

async fn serial_logs(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<SerialConfigLog>>, ApiError> {
    ok_json(svc.serial_logs(&params))
}
