//! Managed backend adapter
//!
//! Uses the PostgREST interface exposed by hosted backends under
//! `/rest/v1/<table>`. Every request carries the project API key both as the
//! `apikey` header and as a bearer token.
//!
//! Tables: `admin_access (secret_key)`, `responses`, `audit_log`, `error_log`.

use super::{build_client, ensure_success, normalize_base_url, ResponseStore, Result, StoreError};
use crate::voting::{AuditEvent, ErrorReport, Vote};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct AdminAccessRow {
    secret_key: String,
}

/// Managed-backend [`ResponseStore`]
#[derive(Debug, Clone)]
pub struct BaasStore {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl BaasStore {
    /// Create an adapter for the project at `url`
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "managed backend requires an API key".to_string(),
            ));
        }
        Ok(Self {
            client: build_client(timeout)?,
            url: normalize_base_url(url)?,
            api_key: api_key.to_string(),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/rest/v1/{}", self.url, name)
    }

    fn get(&self, url: String) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(url))
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(url))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("authorization", format!("Bearer {}", self.api_key))
    }

    async fn insert<T: serde::Serialize + ?Sized>(&self, table: &str, row: &T) -> Result<()> {
        let response = self
            .post(self.table(table))
            .header("prefer", "return=minimal")
            .json(row)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResponseStore for BaasStore {
    async fn admin_secret(&self) -> Result<String> {
        let response = self
            .get(format!("{}?select=secret_key&limit=1", self.table("admin_access")))
            .send()
            .await?;
        let rows: Vec<AdminAccessRow> = ensure_success(response).await?.json().await?;
        rows.into_iter()
            .next()
            .map(|row| row.secret_key)
            .ok_or_else(|| StoreError::Unavailable("admin_access table is empty".to_string()))
    }

    async fn append_audit_log(&self, event: AuditEvent) -> Result<()> {
        self.insert("audit_log", &event).await
    }

    async fn create_vote(&self, vote: Vote) -> Result<Vote> {
        let response = self
            .post(self.table("responses"))
            .header("prefer", "return=representation")
            .json(&vote)
            .send()
            .await?;
        let mut rows: Vec<Vote> = ensure_success(response).await?.json().await?;
        if rows.is_empty() {
            return Ok(vote);
        }
        Ok(rows.swap_remove(0))
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        let response = self
            .get(format!("{}?select=*&order=id.asc", self.table("responses")))
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn record_error(&self, report: ErrorReport) -> Result<()> {
        self.insert("error_log", &report).await
    }
}
