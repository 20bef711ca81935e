use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::{blocking, ok_json, ApiError, AppState};
use crate::model::{Configuration, Field, YearFormat};
use crate::service::Preview;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/configs", get(list_configs).post(create_config))
        .route("/configs/template", get(config_template))
        .route(
            "/configs/{id}",
            get(get_config).put(update_config).delete(delete_config),
        )
        .route("/configs/{id}/preview", get(preview))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigBody {
    fields: Vec<Field>,
    #[serde(default)]
    year_format: YearFormat,
}

async fn list_configs(State(svc): State<AppState>) -> Result<Json<Vec<Configuration>>, ApiError> {
    ok_json(svc.list_configs())
}

async fn create_config(
    State(svc): State<AppState>,
    Json(body): Json<ConfigBody>,
) -> Result<Json<Configuration>, ApiError> {
    ok_json(svc.create_config(body.fields, body.year_format))
}

async fn config_template(State(svc): State<AppState>) -> Json<Vec<Field>> {
    Json(svc.config_template())
}

async fn get_config(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Configuration>, ApiError> {
    ok_json(svc.get_config(&id))
}

async fn update_config(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ConfigBody>,
) -> Result<Json<Configuration>, ApiError> {
    ok_json(svc.update_config(&id, body.fields, body.year_format))
}

async fn delete_config(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    svc.delete_config(&id)?;
    Ok(Json(serde_json::json!({"ok": true})))
}

async fn preview(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Preview>, ApiError> {
    blocking(svc, move |svc| svc.preview(&id)).await
}
