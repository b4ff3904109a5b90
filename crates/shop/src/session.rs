//! Session storage interface backing the cart.
//!
//! The original cart lived directly on the web framework's session object.
//! Here the session is an explicit key-value collaborator so the cart can
//! be exercised without any request context.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::SessionId;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors that can occur when interacting with the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session backend failed.
    #[error("Session backend error: {0}")]
    Backend(String),
}

/// Key-value storage scoped to one browser session.
///
/// All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Reads a value stored under `key` for the given session.
    async fn get(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, SessionError>;

    /// Writes a value under `key` for the given session.
    async fn put(
        &self,
        session: &SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SessionError>;

    /// Removes a key from the session, if present.
    async fn remove(&self, session: &SessionId, key: &str) -> Result<(), SessionError>;
}

/// In-memory session store implementation for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, HashMap<String, serde_json::Value>>>>,
}

impl InMemorySessionStore {
    /// Creates a new empty in-memory session store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every key for the given session, simulating session expiry.
    pub async fn destroy(&self, session: &SessionId) {
        self.sessions.write().await.remove(session);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(
        &self,
        session: &SessionId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, SessionError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session).and_then(|s| s.get(key)).cloned())
    }

    async fn put(
        &self,
        session: &SessionId,
        key: &str,
        value: serde_json::Value,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session.clone())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, session: &SessionId, key: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        if let Some(s) = sessions.get_mut(session) {
            s.remove(key);
        }
        Ok(())
    }
}
