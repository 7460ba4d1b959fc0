//! In-memory store
//!
//! Backs the bundled store server and the tests. Failure injection lets tests
//! exercise the widget's degraded paths.

use super::{ResponseStore, Result, StoreError};
use crate::voting::{AuditEvent, ErrorReport, Vote};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Store holding everything in process memory
#[derive(Debug)]
pub struct MemoryStore {
    admin_secret: RwLock<String>,
    /// Votes in insertion order
    votes: RwLock<Vec<Vote>>,
    audit_log: RwLock<Vec<AuditEvent>>,
    errors: RwLock<Vec<ErrorReport>>,
    /// When set, every call fails with `StoreError::Unavailable`
    offline: AtomicBool,
    create_calls: AtomicUsize,
    secret_reads: AtomicUsize,
}

impl MemoryStore {
    /// Create an empty store guarded by `admin_secret`
    pub fn new(admin_secret: impl Into<String>) -> Self {
        Self {
            admin_secret: RwLock::new(admin_secret.into()),
            votes: RwLock::new(Vec::new()),
            audit_log: RwLock::new(Vec::new()),
            errors: RwLock::new(Vec::new()),
            offline: AtomicBool::new(false),
            create_calls: AtomicUsize::new(0),
            secret_reads: AtomicUsize::new(0),
        }
    }

    /// Replace the admin secret
    pub fn set_admin_secret(&self, secret: impl Into<String>) {
        *self.admin_secret.write() = secret.into();
    }

    /// Simulate the backend going away (or coming back)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of stored votes
    pub fn votes(&self) -> Vec<Vote> {
        self.votes.read().clone()
    }

    /// Snapshot of the audit trail
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.audit_log.read().clone()
    }

    /// Snapshot of recorded diagnostics
    pub fn error_reports(&self) -> Vec<ErrorReport> {
        self.errors.read().clone()
    }

    /// Number of `create_vote` calls received, including failed ones
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `admin_secret` calls received
    pub fn secret_reads(&self) -> usize {
        self.secret_reads.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ResponseStore for MemoryStore {
    async fn admin_secret(&self) -> Result<String> {
        self.secret_reads.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        Ok(self.admin_secret.read().clone())
    }

    async fn append_audit_log(&self, event: AuditEvent) -> Result<()> {
        self.check_online()?;
        self.audit_log.write().push(event);
        Ok(())
    }

    async fn create_vote(&self, vote: Vote) -> Result<Vote> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online()?;
        // The store owns identifiers; anything the caller sent is replaced.
        let stored = vote.with_id(uuid::Uuid::new_v4().to_string());
        self.votes.write().push(stored.clone());
        Ok(stored)
    }

    async fn list_votes(&self) -> Result<Vec<Vote>> {
        self.check_online()?;
        Ok(self.votes())
    }

    async fn record_error(&self, report: ErrorReport) -> Result<()> {
        // Diagnostics are kept even while "offline" so tests can observe them.
        self.errors.write().push(report);
        Ok(())
    }
}
