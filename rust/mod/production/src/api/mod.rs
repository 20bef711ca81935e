pub mod configs;
pub mod grade;
pub mod records;
pub mod relay;
pub mod serial;
pub mod shifts;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Json, Router,
};
use serde::Serialize;

use partline_core::ServiceError;

use crate::error::ProductionError;
use crate::service::ProductionService;

/// Shared application state.
pub type AppState = Arc<ProductionService>;

/// Build the production API router.
pub fn router(state: AppState) -> Router {
    Router::new().nest("/v1", api_routes()).with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(configs::routes())
        .merge(grade::routes())
        .merge(shifts::routes())
        .merge(serial::routes())
        .merge(records::routes())
        .merge(relay::routes())
}

/// API error: a [`ServiceError`] plus optional structured details.
#[derive(Debug)]
pub struct ApiError {
    pub error: ServiceError,
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.error.into_response_with(self.details)
    }
}

impl From<ProductionError> for ApiError {
    fn from(err: ProductionError) -> Self {
        let details = err.details();
        ApiError {
            error: err.into(),
            details,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        ApiError { error, details: None }
    }
}

/// Wrap a service result into an API response.
pub(crate) fn ok_json<T: Serialize>(result: Result<T, ProductionError>) -> Result<Json<T>, ApiError> {
    result.map(Json).map_err(ApiError::from)
}

/// Run a service call that may write the serial counter on the blocking pool.
pub(crate) async fn blocking<T, F>(svc: AppState, call: F) -> Result<Json<T>, ApiError>
where
    T: Serialize + Send + 'static,
    F: FnOnce(&ProductionService) -> Result<T, ProductionError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&svc))
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?;
    ok_json(result)
}

/// Acting user, taken from the optional `x-operator` header.
pub(crate) fn operator(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("x-operator")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
