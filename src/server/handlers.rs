//! HTTP handlers and request/response shapes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use prospect::{DataSource, ProspectError, ProspectPipeline, SearchCriteria, SearchOutcome};

/// Application state shared across handlers
pub struct AppState {
    pub pipeline: ProspectPipeline,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/prospects/search", post(search_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        registry: state.pipeline.registry_mode(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    registry: DataSource,
}

/// The front-end sends the radius as a string, but plain numbers are accepted
#[derive(Deserialize)]
#[serde(untagged)]
enum RadiusField {
    Text(String),
    Number(u32),
}

impl RadiusField {
    fn as_string(&self) -> String {
        match self {
            RadiusField::Text(s) => s.clone(),
            RadiusField::Number(n) => n.to_string(),
        }
    }
}

fn all() -> String {
    "all".to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest {
    #[serde(default)]
    location: String,
    radius: RadiusField,
    #[serde(default = "all")]
    sector: String,
    #[serde(default = "all")]
    created_since: String,
    #[serde(default = "all")]
    company_size: String,
}

#[derive(Serialize)]
struct SearchResponse {
    success: bool,
    #[serde(flatten)]
    outcome: SearchOutcome,
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Error reply in the `{ success: false, error }` shape
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<ProspectError> for ApiError {
    fn from(e: ProspectError) -> Self {
        match e {
            ProspectError::LocationNotFound(_) => {
                ApiError::new(StatusCode::NOT_FOUND, e.to_string())
            }
            ProspectError::InvalidCriteria(_) => {
                ApiError::new(StatusCode::BAD_REQUEST, e.to_string())
            }
            ProspectError::DeadlineExceeded(_) => {
                error!("{}", e);
                ApiError::new(StatusCode::GATEWAY_TIMEOUT, "Search timed out")
            }
            ProspectError::Geocoding(_) => {
                error!("Search failed: {}", e);
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

/// Prospect search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, e.body_text()))?;

    let criteria = SearchCriteria::parse(
        &request.location,
        &request.radius.as_string(),
        &request.sector,
        &request.created_since,
        &request.company_size,
    )
    .map_err(ProspectError::from)?;

    let outcome = state.pipeline.search(&criteria).await?;

    Ok(Json(SearchResponse {
        success: true,
        outcome,
    }))
}
