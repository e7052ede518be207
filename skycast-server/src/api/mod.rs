mod places;
mod weather;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, rejection::QueryRejection},
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use skycast_core::{CitySearch, FailoverResolver, ResolutionError};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: Arc<FailoverResolver>,
    pub search: Arc<CitySearch>,
}

/// Error body: `{"error": "<code>", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "bad-request",
            message: Some(message.into()),
        }
    }

    pub fn not_found() -> Self {
        Self { status: StatusCode::NOT_FOUND, error: "not-found", message: None }
    }

    pub fn search_failed(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: "search-failed",
            message: Some(message.into()),
        }
    }
}

impl From<ResolutionError> for ApiError {
    fn from(err: ResolutionError) -> Self {
        Self { status: StatusCode::SERVICE_UNAVAILABLE, error: err.code(), message: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self)).into_response()
    }
}

/// Unwrap query parameters, turning axum's plain-text rejection into a JSON body.
pub(super) fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Trimmed, non-empty query parameter or a `bad-request` error.
pub(super) fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("missing query parameter '{name}'")))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/weather/current", get(weather::current))
        .route("/api/weather/forecast", get(weather::forecast))
        .route("/api/weather/search", get(weather::search))
        .route("/api/places/lookup", get(places::lookup))
        .layer(build_cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
