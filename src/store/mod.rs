//! Response Store
//!
//! Persistence and query collaborator for votes, the admin secret, and the
//! audit/diagnostic logs. The widget only sees the [`ResponseStore`] trait;
//! the REST, managed-backend and in-memory implementations are interchangeable.

pub mod baas;
pub mod memory;
pub mod rest;

pub use baas::BaasStore;
pub use memory::MemoryStore;
pub use rest::RestStore;

use crate::config::StoreConfig;
use crate::voting::{AuditEvent, ErrorReport, Vote};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Backend used by the voting widget
#[async_trait::async_trait]
pub trait ResponseStore: Send + Sync {
    /// Current admin authorization secret
    async fn admin_secret(&self) -> Result<String>;

    /// Append an audit entry (callers treat this as best-effort)
    async fn append_audit_log(&self, event: AuditEvent) -> Result<()>;

    /// Persist a new vote and return it as stored
    async fn create_vote(&self, vote: Vote) -> Result<Vote>;

    /// All votes in insertion order
    async fn list_votes(&self) -> Result<Vec<Vote>>;

    /// Diagnostic sink (callers treat this as best-effort)
    async fn record_error(&self, report: ErrorReport) -> Result<()>;
}

/// Build the store adapter selected in configuration
pub fn from_config(config: &StoreConfig) -> Result<Arc<dyn ResponseStore>> {
    match config {
        StoreConfig::Rest {
            base_url,
            timeout_seconds,
        } => Ok(Arc::new(RestStore::new(
            base_url,
            Duration::from_secs(*timeout_seconds),
        )?)),
        StoreConfig::Baas {
            url,
            api_key,
            timeout_seconds,
        } => Ok(Arc::new(BaasStore::new(
            url,
            api_key,
            Duration::from_secs(*timeout_seconds),
        )?)),
        StoreConfig::Memory { admin_secret } => Ok(Arc::new(MemoryStore::new(admin_secret))),
    }
}

/// Build the shared HTTP client used by the remote adapters
pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(timeout)
        .build()
        .map_err(StoreError::from)
}

/// Normalise a configured base URL: http(s) only, no trailing slash
pub(crate) fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| StoreError::InvalidConfig(format!("invalid URL \"{raw}\": {e}")))?;
    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(StoreError::InvalidConfig(format!(
            "store URL must use http or https scheme, got \"{scheme}\""
        )));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Turn a non-success response into a [`StoreError::Status`]
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}
