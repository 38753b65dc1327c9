//! Error Types
//!
//! The error taxonomy for the chat core. Decode failures on individual
//! stream lines never surface here: they are logged and skipped inside the
//! stream parser so one malformed line cannot abort a reply.

use thiserror::Error;

/// Errors produced by the chat core
#[derive(Debug, Error)]
pub enum ChatError {
    /// Network-level failure or timeout while talking to the backend
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered, but reported a failure code in its envelope
    #[error("backend error {code}: {message}")]
    Remote {
        /// The `code` field of the response envelope (or the HTTP status
        /// when the body never decoded)
        code: i64,
        /// Human-readable detail from the backend
        message: String,
    },

    /// A response body could not be decoded
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The referenced session no longer exists on the backend
    #[error("session {0} not found")]
    SessionNotFound(String),

    /// A new session could not be created; sending is blocked until the
    /// user retries
    #[error("failed to create session: {0}")]
    SessionCreation(String),
}
