//! Session Lifecycle
//!
//! Owns the identity of the current conversation: which remote session
//! the client is talking in, persisted across restarts through an
//! injected [`SessionIdStore`]. Local state is canonical for continuity:
//! a reset always clears the persisted id even when the remote delete
//! fails, and a stale id (session expired or deleted server-side) is
//! cleared silently instead of surfacing an error.

use std::sync::Arc;

use crate::backend::types::{ListQuery, Message, SessionRecord};
use crate::backend::ChatBackend;
use crate::error::ChatError;
use crate::store::SessionIdStore;

/// Session identity and lifecycle operations
pub struct SessionStore<B, S> {
    backend: Arc<B>,
    ids: S,
    /// Name given to newly created sessions
    session_name: String,
    /// Optional user identifier attributed to created sessions
    user_id: Option<String>,
}

impl<B: ChatBackend, S: SessionIdStore> SessionStore<B, S> {
    /// Create a session store
    pub fn new(
        backend: Arc<B>,
        ids: S,
        session_name: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            backend,
            ids,
            session_name: session_name.into(),
            user_id,
        }
    }

    /// The persisted session id, if any
    pub fn current_id(&self) -> Option<String> {
        self.ids.get()
    }

    /// One-time capture of a server-announced session id
    ///
    /// The first id to arrive wins; later announcements are ignored.
    pub fn capture(&self, id: &str) {
        if self.ids.get().is_none() {
            self.ids.set(id);
        }
    }

    /// Return the persisted session id, creating a session when none exists
    ///
    /// Creation failure maps to [`ChatError::SessionCreation`]; the
    /// caller surfaces it without crashing the message flow.
    pub async fn ensure_session(&self, assistant_id: &str) -> Result<String, ChatError> {
        if let Some(id) = self.ids.get() {
            return Ok(id);
        }
        let record = self.create(assistant_id).await?;
        Ok(record.id)
    }

    /// Create a fresh session and persist its id
    ///
    /// The returned record may carry opener messages for seeding the
    /// transcript.
    pub async fn create(&self, assistant_id: &str) -> Result<SessionRecord, ChatError> {
        let record = self
            .backend
            .create_session(assistant_id, &self.session_name, self.user_id.as_deref())
            .await
            .map_err(|error| ChatError::SessionCreation(error.to_string()))?;

        tracing::info!(session_id = %record.id, assistant_id, "created session");
        self.ids.set(&record.id);
        Ok(record)
    }

    /// Fetch the stored messages of a session
    ///
    /// Zero matches is a terminal "session not found" outcome: the
    /// persisted id is cleared and an empty history returned, never an
    /// error and never a retry.
    pub async fn load_history(
        &self,
        assistant_id: &str,
        session_id: &str,
    ) -> Result<Vec<Message>, ChatError> {
        let query = ListQuery::default().with_id(session_id);
        let sessions = self.backend.list_sessions(assistant_id, &query).await?;

        match sessions.into_iter().find(|s| s.id == session_id) {
            Some(record) => Ok(record.messages),
            None => {
                tracing::info!(session_id, "stored session no longer exists, clearing local id");
                self.ids.clear();
                Ok(Vec::new())
            }
        }
    }

    /// Delete the current session remotely and clear local identity
    ///
    /// The remote delete is best-effort; local state is cleared
    /// regardless of its outcome.
    pub async fn reset(&self, assistant_id: &str) {
        if let Some(id) = self.ids.get() {
            if let Err(error) = self.backend.delete_sessions(assistant_id, &[id.clone()]).await {
                tracing::warn!(%error, session_id = %id, "remote session delete failed");
            }
        }
        self.ids.clear();
    }

    /// List sessions under an assistant
    pub async fn list(
        &self,
        assistant_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<SessionRecord>, ChatError> {
        self.backend.list_sessions(assistant_id, query).await
    }

    /// Delete a specific session, clearing local identity when it is the
    /// current one
    pub async fn delete(&self, assistant_id: &str, session_id: &str) -> Result<(), ChatError> {
        self.backend
            .delete_sessions(assistant_id, &[session_id.to_string()])
            .await?;
        if self.ids.get().as_deref() == Some(session_id) {
            self.ids.clear();
        }
        Ok(())
    }
}
