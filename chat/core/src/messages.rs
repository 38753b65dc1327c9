//! Controller Messages
//!
//! Messages sent from the chat controller to a UI surface. Surfaces are
//! pure renderers: they display what the controller tells them to and
//! report user actions back as [`crate::events::SurfaceEvent`]s. This
//! separation keeps the controller headless and testable without any UI
//! framework.

use serde::{Deserialize, Serialize};

use crate::backend::types::{MessageRole, SessionRecord};
use crate::reference::DocumentRef;

/// Messages from the controller to a UI surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ControllerMessage {
    /// A complete message to display (history replay, user echo)
    Message {
        /// Who sent this message
        role: MessageRole,
        /// The message content
        content: String,
        /// Source documents cited by the message
        citations: Vec<DocumentRef>,
    },

    /// Cumulative replacement text for the in-flight assistant reply
    ///
    /// Each update carries the full reply so far, not a delta.
    AnswerUpdate {
        /// The reply accumulated so far
        content: String,
        /// Citations merged so far
        citations: Vec<DocumentRef>,
    },

    /// The in-flight reply finished
    StreamEnd {
        /// Final reply content
        content: String,
        /// Final citation list
        citations: Vec<DocumentRef>,
    },

    /// The in-flight reply failed; the already-shown user message stays
    StreamError {
        /// Error description
        error: String,
    },

    /// Controller state change
    State {
        /// The new state
        state: ChatState,
    },

    /// Session identity information
    SessionInfo {
        /// Current session id, if one exists
        session_id: Option<String>,
        /// Assistant the conversation belongs to
        assistant_id: String,
        /// Assistant display name
        assistant_name: String,
    },

    /// The transcript was cleared (reset or current session deleted)
    TranscriptCleared,

    /// Result of a session listing request
    SessionList {
        /// The sessions, in backend order
        sessions: Vec<SessionRecord>,
    },

    /// System notification
    Notify {
        /// Notification level
        level: NotifyLevel,
        /// Message content
        message: String,
    },

    /// Request surface to quit
    Quit,
}

/// Notification levels
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// Informational
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
    /// Success
    Success,
}

/// Controller operational states
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatState {
    /// Ready for input
    Idle,
    /// User message sent, waiting for the stream to open
    Sending,
    /// Reply fragments are arriving
    Streaming,
    /// The last send failed
    Error,
}

impl ChatState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Sending => "Sending...",
            Self::Streaming => "Answering...",
            Self::Error => "Error",
        }
    }

    /// Whether the controller accepts a new submission in this state
    #[must_use]
    pub fn accepts_input(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_descriptions() {
        assert_eq!(ChatState::Idle.description(), "Ready");
        assert_eq!(ChatState::Streaming.description(), "Answering...");
    }

    #[test]
    fn test_only_idle_accepts_input() {
        assert!(ChatState::Idle.accepts_input());
        assert!(!ChatState::Sending.accepts_input());
        assert!(!ChatState::Streaming.accepts_input());
        assert!(!ChatState::Error.accepts_input());
    }
}
