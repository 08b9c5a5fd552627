//! HTTP service exposing the converter.
//!
//! | Route | Method | Response |
//! |-------|--------|----------|
//! | `/convert?url=...` | GET | `200 text/plain` Markdown, or `{"detail": ...}` with 400/500 |
//! | `/convert/batch` | POST | `200` JSON [`BatchResponse`], one entry per input URL |
//! | `/health` | GET | `200 ok` |
//!
//! Every request goes through the same [`PageConverter`], so all of them
//! share one HTTP client and one admission gate.

use crate::batch::convert_batch;
use crate::config::ServerConfig;
use crate::convert::PageConverter;
use crate::error::Web2MdError;
use crate::output::{BatchRequest, BatchResponse, ConversionRequest};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// State shared by every handler.
pub struct AppState {
    pub converter: PageConverter,
}

impl AppState {
    pub fn new(converter: PageConverter) -> Self {
        Self { converter }
    }
}

/// Build the axum Router with all endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/convert", get(handle_convert))
        .route("/convert/batch", post(handle_batch))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_addr()` and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> Result<(), Web2MdError> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Web2MdError::Internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| Web2MdError::Internal(format!("Server error: {e}")))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn handle_convert(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ConversionRequest>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(request) = query.map_err(|e| Web2MdError::InvalidUrl {
        url: String::new(),
        reason: format!("missing 'url' query parameter ({e})"),
    })?;

    let markdown = state.converter.convert(&request.url).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        markdown,
    )
        .into_response())
}

async fn handle_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Json<BatchResponse> {
    let results = convert_batch(&state.converter, &request.urls).await;
    Json(BatchResponse { results })
}

// ── Errors ────────────────────────────────────────────────────────────────

/// Library error rendered as `{"detail": "..."}`.
pub struct ApiError(Web2MdError);

impl From<Web2MdError> for ApiError {
    fn from(e: Web2MdError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        warn!("{} → {}", self.0, status.as_u16());
        let body = serde_json::json!({ "detail": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}
