//! REST store adapter
//!
//! Talks to a plain JSON-over-HTTP response service:
//!
//! - `GET  /adminAccess` -> `{"secretKey": "..."}`
//! - `GET  /responses`   -> `[Vote]`
//! - `POST /responses`   -> `Vote`
//! - `POST /auditLog`, `POST /errors` -> empty body

use super::{build_client, ensure_success, normalize_base_url, ResponseStore, Result};
use crate::voting::{AuditEvent, ErrorReport, Vote};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default address of the bundled store server
pub const DEFAULT_REST_BASE_URL: &str = "http://localhost:8000";

/// Body of `GET /adminAccess`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminAccessResponse {
    pub secret_key: String,
}

/// REST-backed [`ResponseStore`]
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestStore {
    /// Create an adapter for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: normalize_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl ResponseStore for RestStore {
    async fn admin_secret(&self) -> Result<String> {
        let response = self.client.get(self.endpoint("adminAccess")).send().await?;
        let body: AdminAccessResponse = ensure_success(response).await?.json().await?;
        Ok(body.secret_key)
    }

    async fn append_audit_log(&self, event: AuditEvent) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("auditLog"))
            .json(&event)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    async fn create_vote(&self, vote: Vote) -> Result<Vote> {
        let response = self
            .client
            .post(self.endpoint("responses"))
            .json(&vote)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        // Older deployments answer with an empty body; fall back to what we sent.
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(vote);
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        let response = self.client.get(self.endpoint("responses")).send().await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn record_error(&self, report: ErrorReport) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("errors"))
            .json(&report)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}
