//! REST store server
//!
//! Exposes a [`MemoryStore`] over the wire contract consumed by
//! [`RestStore`](crate::store::RestStore).

use crate::store::rest::AdminAccessResponse;
use crate::store::{MemoryStore, ResponseStore, StoreError};
use crate::voting::{AuditEvent, ErrorReport, Vote};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

/// Store failure rendered as a JSON error body
#[derive(Debug)]
pub struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self.0, "store request failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Build the store router
pub fn create_store_router(store: Arc<MemoryStore>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/adminAccess", get(admin_access))
        .route("/responses", get(list_responses).post(create_response))
        .route("/auditLog", post(append_audit))
        .route("/errors", post(record_error))
        .with_state(store)
}

async fn health(State(store): State<Arc<MemoryStore>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "votes": store.votes().len(),
    }))
}

async fn admin_access(
    State(store): State<Arc<MemoryStore>>,
) -> Result<Json<AdminAccessResponse>, ApiError> {
    let secret_key = store.admin_secret().await?;
    Ok(Json(AdminAccessResponse { secret_key }))
}

async fn list_responses(State(store): State<Arc<MemoryStore>>) -> Result<Json<Vec<Vote>>, ApiError> {
    Ok(Json(store.list_votes().await?))
}

async fn create_response(
    State(store): State<Arc<MemoryStore>>,
    Json(vote): Json<Vote>,
) -> Result<(StatusCode, Json<Vote>), ApiError> {
    let stored = store.create_vote(vote).await?;
    tracing::debug!(id = stored.id().unwrap_or_default(), "response stored");
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn append_audit(
    State(store): State<Arc<MemoryStore>>,
    Json(event): Json<AuditEvent>,
) -> Result<StatusCode, ApiError> {
    tracing::info!(action = %event.action, "audit entry");
    store.append_audit_log(event).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn record_error(
    State(store): State<Arc<MemoryStore>>,
    Json(report): Json<ErrorReport>,
) -> Result<StatusCode, ApiError> {
    tracing::warn!(context = %report.context, message = %report.message, "client error report");
    store.record_error(report).await?;
    Ok(StatusCode::NO_CONTENT)
}
