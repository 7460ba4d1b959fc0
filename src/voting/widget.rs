//! Voting Widget
//!
//! One page session: the voter flow, the admin gate, and the tally shown in
//! the admin dashboard. Session state lives only as long as the widget.

use super::model::{AuditEvent, ErrorReport, Tally, Video, Vote};
use crate::auth::{timing_safe_eq, PageAddress};
use crate::config::WidgetConfig;
use crate::store::{ResponseStore, StoreError};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;

/// Audit action written after a successful admin verification
pub const ADMIN_ACCESS_GRANTED: &str = "admin_access_granted";

/// Per-session flags. Both only ever move from `false` to `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub has_voted: bool,
    pub is_admin: bool,
    pub selected_liar: Option<Video>,
}

/// Latest results fetched from the store
#[derive(Debug, Clone, Default)]
struct Results {
    tally: Tally,
    /// Kept for admin sessions only
    responses: Vec<Vote>,
}

/// What the voter sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterView {
    pub has_voted: bool,
    pub selected_liar: Option<Video>,
}

impl VoterView {
    /// Choice buttons are disabled once a vote was submitted
    pub fn controls_enabled(&self) -> bool {
        !self.has_voted
    }
}

/// What a verified admin sees
#[derive(Debug, Clone, PartialEq)]
pub struct AdminView {
    pub tally: Tally,
    pub success_percentage: u32,
    /// Most recent first
    pub responses: Vec<Vote>,
}

/// The two mutually exclusive views
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Voter(VoterView),
    Admin(AdminView),
}

/// Spot-the-liar voting session bound to a [`ResponseStore`]
pub struct VotingWidget {
    store: Arc<dyn ResponseStore>,
    config: WidgetConfig,
    session: RwLock<SessionState>,
    results: RwLock<Results>,
}

impl std::fmt::Debug for VotingWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VotingWidget")
            .field("config", &self.config)
            .field("session", &*self.session.read())
            .finish_non_exhaustive()
    }
}

impl VotingWidget {
    /// Start a fresh session: not voted, not admin, empty tally
    pub fn new(store: Arc<dyn ResponseStore>, config: WidgetConfig) -> Self {
        Self {
            store,
            config,
            session: RwLock::new(SessionState::default()),
            results: RwLock::new(Results::default()),
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn session(&self) -> SessionState {
        *self.session.read()
    }

    pub fn tally(&self) -> Tally {
        self.results.read().tally
    }

    /// Raw votes held by this session. Always empty for non-admins.
    pub fn responses(&self) -> Vec<Vote> {
        self.results.read().responses.clone()
    }

    /// Verify the `admin` token carried by `page`.
    ///
    /// Without a token this returns immediately without touching the store.
    /// On a match the session becomes admin and the token is removed from
    /// `page`. Mismatches and store failures leave the session unchanged.
    pub async fn check_admin_access(&self, page: &mut PageAddress) -> bool {
        if self.session.read().is_admin {
            return true;
        }
        let Some(token) = page.admin_token() else {
            return false;
        };

        let secret = match self.store.admin_secret().await {
            Ok(secret) => secret,
            Err(e) => {
                self.report("admin_verification", &e).await;
                return false;
            }
        };

        if secret.is_empty() || !timing_safe_eq(&secret, &token) {
            tracing::debug!("admin token rejected");
            return false;
        }

        self.session.write().is_admin = true;
        page.strip_admin_token();
        tracing::info!("admin access granted");

        if self.config.audit_admin_access {
            let event = AuditEvent::new(ADMIN_ACCESS_GRANTED).with_detail(page.visible());
            if let Err(e) = self.store.append_audit_log(event).await {
                tracing::warn!(error = %e, "failed to append audit entry");
            }
        }
        true
    }

    /// Record the visitor's pick and refresh the tally.
    ///
    /// Only the first call per session does anything. The session is marked
    /// as voted before the store is contacted, so repeated clicks while the
    /// request is in flight are ignored as well.
    pub async fn submit_vote(&self, choice: Video) {
        {
            let mut session = self.session.write();
            if session.has_voted {
                tracing::debug!(choice = %choice, "ignoring repeated vote");
                return;
            }
            session.has_voted = true;
            session.selected_liar = Some(choice);
        }

        let vote = Vote::cast(choice, self.config.designated_liar, Utc::now());
        match self.store.create_vote(vote).await {
            Ok(stored) => {
                tracing::info!(
                    choice = %choice,
                    correct = stored.is_correct(),
                    "vote recorded"
                );
            }
            Err(e) => self.report("submit_vote", &e).await,
        }

        self.refresh_tally().await;
    }

    /// Reload every vote and recompute the tally.
    ///
    /// Individual votes are kept only when the session is admin at the time
    /// the list arrives. A failed fetch keeps the previous results.
    pub async fn refresh_tally(&self) {
        let votes = match self.store.list_votes().await {
            Ok(votes) => votes,
            Err(e) => {
                self.report("refresh_tally", &e).await;
                return;
            }
        };

        let tally = Tally::from_votes(&votes);
        let responses = if self.session.read().is_admin {
            votes
        } else {
            Vec::new()
        };
        tracing::debug!(correct = tally.correct, wrong = tally.wrong, "tally refreshed");

        *self.results.write() = Results { tally, responses };
    }

    /// The view to render, chosen solely by admin state
    pub fn view(&self) -> View {
        let session = self.session();
        if !session.is_admin {
            return View::Voter(VoterView {
                has_voted: session.has_voted,
                selected_liar: session.selected_liar,
            });
        }

        let results = self.results.read();
        let mut responses = results.responses.clone();
        responses.sort_by(|a, b| b.submitted_at().cmp(&a.submitted_at()));
        View::Admin(AdminView {
            tally: results.tally,
            success_percentage: results.tally.success_percentage(),
            responses,
        })
    }

    async fn report(&self, context: &str, error: &StoreError) {
        tracing::warn!(context, error = %error, "store request failed");
        let report = ErrorReport::new(context, error.to_string());
        if let Err(e) = self.store.record_error(report).await {
            tracing::debug!(error = %e, "failed to record diagnostic");
        }
    }
}
