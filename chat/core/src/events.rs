//! Surface Events
//!
//! Events sent from a UI surface to the chat controller. Surfaces
//! forward user actions without interpreting them; the controller
//! decides how to respond and answers with
//! [`crate::messages::ControllerMessage`]s.

use serde::{Deserialize, Serialize};

/// Events from a UI surface to the controller
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// User submitted a question
    Submit {
        /// The question text
        content: String,
    },

    /// User asked to reset the current conversation
    Reset,

    /// User asked for the session listing
    ListSessions,

    /// User deleted a specific session
    DeleteSession {
        /// The session to delete
        session_id: String,
    },

    /// User requested quit
    QuitRequested,
}
