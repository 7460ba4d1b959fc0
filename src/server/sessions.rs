//! Page session registry
//!
//! Each page load gets its own [`VotingWidget`] together with the address the
//! page was loaded at (admin token already removed), so form posts can put
//! the visitor back on that address. Sessions are looked up by an
//! opaque id carried in the page's forms and expire after a period of
//! inactivity. The registry is also capped; when full, the least recently
//! used session makes room for the new one.

use crate::voting::VotingWidget;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A live page session
#[derive(Debug, Clone)]
pub struct PageSession {
    pub widget: Arc<VotingWidget>,
    /// Visible page address (path + query)
    pub address: String,
}

#[derive(Debug)]
struct Entry {
    session: PageSession,
    last_seen: Instant,
}

/// In-memory map of live page sessions
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            max_sessions: max_sessions.max(1),
        }
    }

    /// Register a widget and return its session id. Expired sessions are pruned first.
    pub fn insert(&self, widget: Arc<VotingWidget>, address: impl Into<String>) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "expired page sessions dropped");
        }
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::debug!(session = %oldest, "session cap reached, evicted least recent");
        }
        sessions.insert(
            id.clone(),
            Entry {
                session: PageSession {
                    widget,
                    address: address.into(),
                },
                last_seen: now,
            },
        );
        id
    }

    /// Look up a live session and mark it as active
    pub fn get(&self, id: &str) -> Option<PageSession> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        match sessions.get_mut(id) {
            Some(entry) if now.duration_since(entry.last_seen) < self.ttl => {
                entry.last_seen = now;
                return Some(entry.session.clone());
            }
            Some(_) => {}
            None => return None,
        }
        sessions.remove(id);
        None
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
