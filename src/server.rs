//! HTTP boundary of the recommender.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use crate::domain::assessment::{QueryRequest, QueryResponse};
use crate::errors::RecommendError;
use crate::processing::recommender::Recommender;

pub const API_VERSION: &str = "1.0";

#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    /// When the loaded catalog was ingested.
    pub ingested_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub version: &'static str,
    pub gemini_ai: &'static str,
    pub vector_db: String,
    pub assessments: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingested_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

/// Maps pipeline failures to client (400) or server (500) errors. Malformed
/// request bodies keep the status axum assigns to the rejection.
pub enum ApiError {
    Recommend(RecommendError),
    Payload(JsonRejection),
}

impl From<RecommendError> for ApiError {
    fn from(value: RecommendError) -> Self {
        Self::Recommend(value)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        Self::Payload(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Recommend(error) if error.is_client_error() => {
                log::warn!("Rejected query: {error}");
                (StatusCode::BAD_REQUEST, error.to_string())
            }
            ApiError::Recommend(error) => {
                log::error!("Failed to serve recommendation: {error}");
                (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
            ApiError::Payload(rejection) => {
                log::warn!("Rejected request body: {}", rejection.body_text());
                (rejection.status(), rejection.body_text())
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/recommend", post(recommend))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `bind_address` and serve until the process exits.
pub async fn serve(state: AppState, bind_address: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    log::info!("Assessment recommender listening on http://{bind_address}");
    axum::serve(listener, router(state)).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Assessment Recommendation API",
        "version": API_VERSION,
        "endpoints": {
            "health": "/health",
            "recommend": "/recommend (POST)"
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let assessments = state.recommender.catalog().len();
    let vector_db = if assessments == 0 {
        "not initialized".to_string()
    } else {
        format!("ready ({assessments} assessments)")
    };

    Json(HealthResponse {
        status: "healthy",
        message: "Assessment Recommendation API is running",
        version: API_VERSION,
        gemini_ai: if state.recommender.generator_available() {
            "connected"
        } else {
            "unavailable"
        },
        vector_db,
        assessments,
        ingested_at: state.ingested_at,
    })
}

async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.recommender.recommend(&request).await?))
}
