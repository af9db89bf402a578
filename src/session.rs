//! In-memory [`SessionStore`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::middleware::{BoxError, NewSession, SessionStore};
use crate::pkce;
use crate::types::{AuthenticatedIdentity, SessionId};

#[derive(Debug, Clone)]
struct StoredSession {
    session: NewSession,
    expires_at: Instant,
}

/// Process-local session store with per-session expiry.
///
/// Clones share the same map, so a handle can be kept for inspection after
/// moving a clone into the flow controller. Sessions do not survive a restart.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<SessionId, StoredSession>>,
    ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySessionStore {
    /// Creates an empty store with a one-hour TTL.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(3600),
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Number of stored sessions, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops every expired session. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|_, stored| stored.expires_at > now);
        before.saturating_sub(self.sessions.len())
    }
}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: NewSession) -> Result<SessionId, BoxError> {
        let session_id = SessionId(pkce::generate_session_id());
        let stored = StoredSession {
            session,
            expires_at: Instant::now() + self.ttl,
        };
        self.sessions.insert(session_id.clone(), stored);
        Ok(session_id)
    }

    async fn get(&self, session_id: &SessionId) -> Result<Option<AuthenticatedIdentity>, BoxError> {
        let now = Instant::now();
        let removed = self
            .sessions
            .remove_if(session_id, |_, stored| stored.expires_at <= now);
        if removed.is_some() {
            tracing::debug!(session_id = %session_id, "Session expired");
            return Ok(None);
        }
        Ok(self
            .sessions
            .get(session_id)
            .map(|entry| entry.session.identity.clone()))
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), BoxError> {
        self.sessions.remove(session_id);
        Ok(())
    }
}
