//! Chat Backend Trait
//!
//! Trait seam for the remote chat backend. The controller and session
//! layer only ever talk through this interface, which keeps them
//! testable with scripted doubles and leaves provider-specific details
//! (endpoints, auth, streaming format) to the implementations.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{Assistant, ListQuery, SessionRecord, StreamEvent};
use crate::error::ChatError;

/// Updates delivered over a streaming-completion channel
///
/// The channel yields decoded events in arrival order and always ends
/// with exactly one terminal update.
#[derive(Clone, Debug)]
pub enum StreamUpdate {
    /// A decoded event from the response body
    Event(StreamEvent),
    /// The transport completed; no further events follow
    Done,
    /// The stream failed mid-flight
    Failed(String),
}

/// Remote chat backend interface
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Backend name, for logs
    fn name(&self) -> &str;

    /// List the configured chat assistants
    async fn list_assistants(&self, query: &ListQuery) -> Result<Vec<Assistant>, ChatError>;

    /// Create a session under an assistant
    ///
    /// The returned record may already contain opener messages.
    async fn create_session(
        &self,
        assistant_id: &str,
        name: &str,
        user_id: Option<&str>,
    ) -> Result<SessionRecord, ChatError>;

    /// List sessions under an assistant
    async fn list_sessions(
        &self,
        assistant_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<SessionRecord>, ChatError>;

    /// Delete sessions by id
    async fn delete_sessions(&self, assistant_id: &str, ids: &[String]) -> Result<(), ChatError>;

    /// Ask a question and stream the reply
    ///
    /// Returns a channel receiver delivering [`StreamUpdate`]s as the
    /// body arrives. Dropping the receiver cancels the stream: the
    /// transport task notices the closed channel and stops.
    async fn stream_completion(
        &self,
        assistant_id: &str,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<mpsc::Receiver<StreamUpdate>, ChatError>;
}
