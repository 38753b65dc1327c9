//! Chat Backend Abstraction
//!
//! The trait seam for the remote backend, its wire types, and the
//! RAGFlow HTTP implementation.

pub mod ragflow;
pub mod traits;
pub mod types;

pub use ragflow::RagflowBackend;
pub use traits::{ChatBackend, StreamUpdate};
pub use types::{
    AnswerPayload, ApiEnvelope, Assistant, EventData, ListQuery, Message, MessageRole, Reference,
    ReferenceChunk, ReferenceItem, SessionRecord, StreamEvent,
};
