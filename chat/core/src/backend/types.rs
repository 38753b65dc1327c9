//! Backend Wire Types
//!
//! Serde models for everything the remote chat backend sends and receives.
//! Citation metadata arrives in two shapes: streamed replies carry the
//! aggregate `references` form, session history carries a flat `reference`
//! list. Both are normalized into [`crate::reference::DocumentRef`] at the
//! boundary so nothing past this module has to care about the difference.

use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Response envelope wrapping every non-streaming backend reply
#[derive(Clone, Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    /// Backend status code; zero means success
    pub code: i64,
    /// Human-readable detail, present on failures
    #[serde(default)]
    pub message: Option<String>,
    /// The payload; may be absent on error responses
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, mapping non-zero codes to [`ChatError::Remote`]
    pub fn into_result(self) -> Result<T, ChatError> {
        self.check_code()?;
        self.data.ok_or(ChatError::Remote {
            code: 0,
            message: "successful response carried no payload".to_string(),
        })
    }

    /// Check only the status code, ignoring any payload
    pub fn check_code(&self) -> Result<(), ChatError> {
        if self.code == 0 {
            return Ok(());
        }
        Err(ChatError::Remote {
            code: self.code,
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "unspecified backend error".to_string()),
        })
    }
}

/// A server-side configured chat profile
///
/// Only the identifier is consumed by the core; the remaining fields are
/// tolerated for display purposes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Assistant {
    /// Opaque assistant id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// The remote assistant
    Assistant,
}

/// A message as stored by the backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: MessageRole,
    /// Message content
    #[serde(default)]
    pub content: String,
    /// Citations in the streamed (live) shape
    #[serde(default)]
    pub references: Option<Reference>,
    /// Citations in the session-history shape
    #[serde(default)]
    pub reference: Option<Vec<ReferenceItem>>,
}

/// Aggregate citation metadata attached to a streamed reply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Reference {
    /// Total retrieved chunks
    #[serde(default)]
    pub total: u64,
    /// The retrieved content chunks
    #[serde(default)]
    pub chunks: Vec<ReferenceChunk>,
    /// Per-document aggregation
    #[serde(default)]
    pub doc_aggs: Vec<DocAgg>,
}

/// One retrieved content chunk inside a live [`Reference`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReferenceChunk {
    /// Chunk text
    #[serde(default)]
    pub content: String,
    /// Source document id
    #[serde(default)]
    pub document_id: String,
    /// Source document display name
    #[serde(default)]
    pub document_name: String,
    /// Dataset the document belongs to
    #[serde(default)]
    pub dataset_id: String,
    /// Chunk id
    #[serde(default)]
    pub id: String,
    /// Retrieval similarity score
    #[serde(default)]
    pub similarity: f64,
}

/// Per-document aggregation row inside a live [`Reference`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocAgg {
    /// Document display name
    #[serde(default)]
    pub doc_name: String,
    /// Document id
    #[serde(default)]
    pub doc_id: String,
    /// Number of chunks drawn from this document
    #[serde(default)]
    pub count: u64,
}

/// One citation entry in the session-history shape
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReferenceItem {
    /// Chunk text
    #[serde(default)]
    pub content: String,
    /// Dataset the document belongs to
    #[serde(default)]
    pub dataset_id: String,
    /// Source document id
    #[serde(default)]
    pub document_id: String,
    /// Source document display name
    #[serde(default)]
    pub document_name: String,
    /// Chunk id
    #[serde(default)]
    pub id: String,
}

/// A conversation thread as stored by the backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Opaque session id
    pub id: String,
    /// Owning assistant id (the backend calls this field `chat`)
    #[serde(default, rename = "chat")]
    pub assistant_id: String,
    /// Session display name
    #[serde(default)]
    pub name: String,
    /// Creation time, unix milliseconds
    #[serde(default)]
    pub create_time: Option<u64>,
    /// Last-update time, unix milliseconds
    #[serde(default)]
    pub update_time: Option<u64>,
    /// Creation date as a display string
    #[serde(default)]
    pub create_date: Option<String>,
    /// Last-update date as a display string
    #[serde(default)]
    pub update_date: Option<String>,
    /// Messages exchanged so far (includes assistant openers on creation)
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// One decoded unit of the streamed completion body
#[derive(Clone, Debug, Deserialize)]
pub struct StreamEvent {
    /// Backend status code; non-zero events carry no usable content
    pub code: i64,
    /// Human-readable detail on failures
    #[serde(default)]
    pub message: Option<String>,
    /// Content payload, or a bare boolean for control events
    pub data: EventData,
}

/// Payload of a [`StreamEvent`]
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    /// A content-bearing fragment
    Answer(AnswerPayload),
    /// Keep-alive / end-marker control event; carries no content
    Control(bool),
}

/// A content-bearing stream fragment
///
/// `answer` is cumulative: each fragment carries the full reply text so
/// far, not a delta.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnswerPayload {
    /// The reply text accumulated so far
    #[serde(default)]
    pub answer: Option<String>,
    /// Citations retrieved for this reply
    #[serde(default)]
    pub reference: Option<Reference>,
    /// Session this reply belongs to
    #[serde(default)]
    pub session_id: Option<String>,
    /// Backend-side message id
    #[serde(default)]
    pub id: Option<String>,
}

/// Request body for creating a session
#[derive(Clone, Debug, Serialize)]
pub struct CreateSessionRequest {
    /// Display name for the new session
    pub name: String,
    /// Optional user identifier the session is attributed to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Request body for a streamed completion
#[derive(Clone, Debug, Serialize)]
pub struct CompletionRequest {
    /// The user's question
    pub question: String,
    /// Always true; the core only consumes the streaming form
    pub stream: bool,
    /// Session to continue; omitted for sessionless sends
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Query parameters for the paginated listing endpoints
#[derive(Clone, Debug, Serialize)]
pub struct ListQuery {
    /// 1-based page number
    pub page: u32,
    /// Rows per page
    pub page_size: u32,
    /// Ordering field (`create_time` or `update_time`)
    pub orderby: String,
    /// Descending order flag
    pub desc: bool,
    /// Filter by display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Filter by id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Filter by owning user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            orderby: "create_time".to_string(),
            desc: true,
            name: None,
            id: None,
            user_id: None,
        }
    }
}

impl ListQuery {
    /// Filter by a specific record id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Filter by owning user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Set the page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the page number
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}
