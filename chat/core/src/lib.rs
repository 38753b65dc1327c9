//! Ragchat Core - Headless Chat Client for RAG Backends
//!
//! This crate implements the session and streaming-response core of a
//! chat client for RAGFlow-style retrieval-augmented backends,
//! completely independent of any UI framework. It can drive a terminal
//! client, a GUI, or run headless for testing and automation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       UI Surfaces                         │
//! │   ┌──────────┐   ┌─────────┐   ┌──────────────────────┐  │
//! │   │   CLI    │   │   GUI   │   │  Headless / Tests    │  │
//! │   └────┬─────┘   └────┬────┘   └──────────┬───────────┘  │
//! │        └──────────────┴───────────────────┘              │
//! │                        │                                 │
//! │                 SurfaceEvent (up)                        │
//! │               ControllerMessage (down)                   │
//! │                        │                                 │
//! └────────────────────────┼─────────────────────────────────┘
//!                          │
//! ┌────────────────────────┼─────────────────────────────────┐
//! │                  CHAT CONTROLLER                          │
//! │   ┌──────────┐  ┌────────────┐  ┌──────────────────────┐ │
//! │   │ Session  │  │ Transcript │  │  Backend (HTTP/SSE)  │ │
//! │   │  Store   │  │ (reducer)  │  │   + Stream Parser    │ │
//! │   └──────────┘  └────────────┘  └──────────────────────┘ │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`ChatController`]: the orchestration state machine
//! - [`ControllerMessage`] / [`SurfaceEvent`]: the surface protocol
//! - [`Transcript`]: ordered conversation history and fragment reducer
//! - [`SessionStore`]: session identity, persisted through [`SessionIdStore`]
//! - [`SseParser`]: incremental stream-event parser
//! - [`RagflowBackend`]: HTTP implementation of [`ChatBackend`]
//!
//! # Module Overview
//!
//! - [`backend`]: backend trait, wire types, RAGFlow implementation
//! - [`config`]: client configuration (file + environment)
//! - [`controller`]: the chat controller state machine
//! - [`error`]: error taxonomy
//! - [`events`]: events from UI surfaces to the controller
//! - [`messages`]: messages from the controller to UI surfaces
//! - [`reference`]: citation normalization
//! - [`session`]: session lifecycle operations
//! - [`sse`]: stream-event parsing
//! - [`store`]: persisted session identity
//! - [`transcript`]: conversation history and the fragment reducer
//!
//! # No UI Dependencies
//!
//! This crate has **zero** dependencies on any UI framework. It's pure
//! client logic that can be embedded anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod messages;
pub mod reference;
pub mod session;
pub mod sse;
pub mod store;
pub mod transcript;

// Re-exports for convenience
pub use backend::{
    Assistant, ChatBackend, ListQuery, Message, MessageRole, RagflowBackend, Reference,
    SessionRecord, StreamEvent, StreamUpdate,
};
pub use config::{
    default_config_path, load_config, load_config_from_path, ClientConfig, ClientToml, ConfigError,
};
pub use controller::ChatController;
pub use error::ChatError;
pub use events::SurfaceEvent;
pub use messages::{ChatState, ControllerMessage, NotifyLevel};
pub use reference::DocumentRef;
pub use session::SessionStore;
pub use sse::SseParser;
pub use store::{FileIdStore, MemoryIdStore, SessionIdStore};
pub use transcript::{ChatTurn, Transcript};
