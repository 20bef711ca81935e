use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use partline_core::{ListParams, ListResult};

use super::{blocking, ok_json, operator, ApiError, AppState};
use crate::model::{ProductionRecord, Selection};
use crate::service::Preview;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/selection", get(get_selection).put(set_selection))
        .route("/identifier/current", get(current_identifier))
        .route("/records", get(list_records))
        .route("/records/latest", get(latest_record))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectionBody {
    configuration_id: String,
}

async fn get_selection(State(svc): State<AppState>) -> Result<Json<Option<Selection>>, ApiError> {
    ok_json(svc.get_selection())
}

async fn set_selection(
    State(svc): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SelectionBody>,
) -> Result<Json<Selection>, ApiError> {
    ok_json(svc.select(&body.configuration_id, operator(&headers)))
}

async fn current_identifier(State(svc): State<AppState>) -> Result<Json<Preview>, ApiError> {
    blocking(svc, |svc| svc.current_identifier()).await
}

async fn list_records(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<ProductionRecord>>, ApiError> {
    ok_json(svc.list_records(&params))
}

async fn latest_record(State(svc): State<AppState>) -> Result<Json<Option<ProductionRecord>>, ApiError> {
    ok_json(svc.latest_record())
}
