//! In-memory session store.
//!
//! The index (which sessions exist) is a concurrent map supporting
//! insert/lookup/delete across sessions; each session's mutable state sits
//! behind its own `tokio::sync::Mutex`, so turns within one session are
//! strictly serialized while different sessions proceed in parallel.

use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::catalog::{CatalogError, ScenarioCatalog};
use crate::domain::{Session, SessionId};

/// A session under its per-session lock.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Errors that can occur in session lookup.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Fatal to the requesting operation, never retried.
    #[error("session not found: {0}")]
    NotFound(SessionId),
}

/// Table of active sessions keyed by session id.
pub struct SessionStore {
    catalog: Arc<ScenarioCatalog>,
    sessions: DashMap<SessionId, SessionHandle>,
}

impl SessionStore {
    pub fn new(catalog: Arc<ScenarioCatalog>) -> Self {
        Self {
            catalog,
            sessions: DashMap::new(),
        }
    }

    /// Create a new session for `scenario_id`.
    ///
    /// Validates the scenario against the catalog (propagating `NotFound`
    /// without creating anything), seeds the score at 50/50, applies the
    /// opening script, and registers the session.
    pub fn create(&self, scenario_id: &str) -> Result<SessionHandle, CatalogError> {
        let scenario = self.catalog.get(scenario_id)?;
        let session = Session::new(scenario);
        let id = session.id.clone();
        info!(
            session = %id,
            scenario = scenario_id,
            speaker = %session.speaker_name,
            "session opened at 50/50"
        );
        let handle = Arc::new(Mutex::new(session));
        self.sessions.insert(id, Arc::clone(&handle));
        Ok(handle)
    }

    /// Look up an active session.
    pub fn get(&self, id: &SessionId) -> Result<SessionHandle, SessionError> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Remove a session. Idempotent: removing an absent id is a no-op.
    pub fn remove(&self, id: &SessionId) {
        if self.sessions.remove(id).is_some() {
            info!(session = %id, "session removed");
        }
    }

    /// Number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
