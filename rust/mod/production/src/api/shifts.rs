use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use super::{ok_json, ApiError, AppState};
use crate::model::{ShiftDefinition, ShiftSchedule};
use crate::service::CurrentShift;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shifts", get(get_shifts).put(set_shifts))
        .route("/shifts/current", get(current_shift))
}

#[derive(Deserialize)]
struct ShiftsBody {
    shifts: Vec<ShiftDefinition>,
}

async fn get_shifts(State(svc): State<AppState>) -> Result<Json<ShiftSchedule>, ApiError> {
    ok_json(svc.get_shifts())
}

async fn set_shifts(
    State(svc): State<AppState>,
    Json(body): Json<ShiftsBody>,
) -> Result<Json<ShiftSchedule>, ApiError> {
    ok_json(svc.set_shifts(body.shifts))
}

async fn current_shift(State(svc): State<AppState>) -> Result<Json<CurrentShift>, ApiError> {
    ok_json(svc.current_shift())
}
