//! Chat Controller
//!
//! The orchestration core. On submit it appends the user turn
//! optimistically, makes sure a session exists (creating one
//! transparently when the id was lost), issues the streamed completion
//! call and folds the resulting events into the transcript. It
//! communicates with whatever surface is driving it through a channel of
//! [`ControllerMessage`]s and reacts to [`SurfaceEvent`]s, so it can run
//! under a terminal client, a GUI, or a headless test harness unchanged.
//!
//! # State machine
//!
//! `Idle -> Sending -> Streaming -> Idle` on the success path, or
//! `Idle -> Sending -> Error -> Idle` on failure. Submissions are
//! rejected while a reply is in flight: the guard lives here, not in the
//! UI. A failed send keeps the already-appended user turn and is never
//! retried automatically.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::types::{Assistant, ListQuery, MessageRole, StreamEvent};
use crate::backend::{ChatBackend, EventData, StreamUpdate};
use crate::config::ClientConfig;
use crate::error::ChatError;
use crate::events::SurfaceEvent;
use crate::messages::{ChatState, ControllerMessage, NotifyLevel};
use crate::session::SessionStore;
use crate::store::SessionIdStore;
use crate::transcript::{ChatTurn, Transcript};

/// The chat controller - headless orchestration core
pub struct ChatController<B, S> {
    /// Configuration
    config: ClientConfig,
    /// Remote backend
    backend: Arc<B>,
    /// Session identity and lifecycle
    sessions: SessionStore<B, S>,
    /// Conversation history
    transcript: Transcript,
    /// Current operational state
    state: ChatState,
    /// Channel to the UI surface
    tx: mpsc::Sender<ControllerMessage>,
    /// The assistant adopted at startup
    assistant: Option<Assistant>,
    /// Receiver for the in-flight reply, if any
    streaming_rx: Option<mpsc::Receiver<StreamUpdate>>,
}

impl<B: ChatBackend + 'static, S: SessionIdStore> ChatController<B, S> {
    /// Create a controller over a backend and an id store
    pub fn new(
        backend: B,
        ids: S,
        config: ClientConfig,
        tx: mpsc::Sender<ControllerMessage>,
    ) -> Self {
        let backend = Arc::new(backend);
        let sessions = SessionStore::new(
            Arc::clone(&backend),
            ids,
            config.session_name.clone(),
            config.user_id.clone(),
        );
        Self {
            config,
            backend,
            sessions,
            transcript: Transcript::new(),
            state: ChatState::Idle,
            tx,
            assistant: None,
            streaming_rx: None,
        }
    }

    /// Current operational state
    pub fn state(&self) -> ChatState {
        self.state
    }

    /// The conversation so far
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The assistant adopted at startup
    pub fn assistant(&self) -> Option<&Assistant> {
        self.assistant.as_ref()
    }

    /// The current session id, if one exists
    pub fn session_id(&self) -> Option<String> {
        self.sessions.current_id()
    }

    /// Whether a reply is currently in flight
    pub fn is_streaming(&self) -> bool {
        self.streaming_rx.is_some()
    }

    /// Initialize the controller
    ///
    /// Adopts the first configured assistant, then rehydrates the
    /// persisted session's history or creates a fresh session (seeding
    /// the transcript with any opener messages). The rehydrated
    /// transcript is replayed to the surface. A failed startup creation
    /// is tolerated: the first send repairs it.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        let assistants = self.backend.list_assistants(&ListQuery::default()).await?;
        let Some(assistant) = assistants.into_iter().next() else {
            return Err(ChatError::Remote {
                code: 0,
                message: "no chat assistants configured on the backend".to_string(),
            });
        };
        tracing::info!(assistant_id = %assistant.id, name = %assistant.name, backend = self.backend.name(), "adopted assistant");

        if let Some(session_id) = self.sessions.current_id() {
            match self.sessions.load_history(&assistant.id, &session_id).await {
                Ok(history) => {
                    self.transcript = Transcript::from_history(&history);
                }
                Err(error) => {
                    tracing::warn!(%error, session_id, "failed to load session history");
                    self.transcript = Transcript::new();
                }
            }
        } else {
            match self.sessions.create(&assistant.id).await {
                Ok(record) => {
                    self.transcript = Transcript::from_history(&record.messages);
                }
                Err(error) => {
                    tracing::warn!(%error, "session creation at startup failed, will retry on first send");
                }
            }
        }

        self.send(ControllerMessage::SessionInfo {
            session_id: self.sessions.current_id(),
            assistant_id: assistant.id.clone(),
            assistant_name: assistant.name.clone(),
        })
        .await;
        for turn in self.transcript.turns().to_vec() {
            self.send(ControllerMessage::Message {
                role: turn.role,
                content: turn.content,
                citations: turn.citations,
            })
            .await;
        }

        self.assistant = Some(assistant);
        Ok(())
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) -> Result<(), ChatError> {
        match event {
            SurfaceEvent::Submit { content } => self.send_message(content).await,
            SurfaceEvent::Reset => self.reset().await,
            SurfaceEvent::ListSessions => self.list_sessions().await,
            SurfaceEvent::DeleteSession { session_id } => self.delete_session(&session_id).await,
            SurfaceEvent::QuitRequested => {
                self.send(ControllerMessage::Quit).await;
                Ok(())
            }
        }
    }

    /// Submit a user question
    ///
    /// Rejected while a reply is in flight. The user turn is appended
    /// before anything can fail and is retained on every failure path.
    pub async fn send_message(&mut self, content: String) -> Result<(), ChatError> {
        if !self.state.accepts_input() {
            tracing::warn!(state = ?self.state, "rejecting submit while a reply is in flight");
            self.notify(NotifyLevel::Warning, "Still answering the previous question")
                .await;
            return Ok(());
        }
        if content.trim().is_empty() {
            return Ok(());
        }
        let Some(assistant) = self.assistant.clone() else {
            self.notify(NotifyLevel::Error, "Chat is not ready yet").await;
            return Ok(());
        };

        self.transcript.push_user(content.clone());
        self.send(ControllerMessage::Message {
            role: MessageRole::User,
            content: content.clone(),
            citations: Vec::new(),
        })
        .await;
        self.set_state(ChatState::Sending).await;

        // the persisted id may have been lost on reload or cleared by a
        // reset; repair it transparently
        let session_id = match self.sessions.ensure_session(&assistant.id).await {
            Ok(id) => id,
            Err(error) => {
                self.fail_send(&error.to_string()).await;
                return Ok(());
            }
        };

        match self
            .backend
            .stream_completion(&assistant.id, &content, Some(&session_id))
            .await
        {
            Ok(rx) => {
                self.streaming_rx = Some(rx);
            }
            Err(error) => {
                self.fail_send(&error.to_string()).await;
            }
        }
        Ok(())
    }

    /// Poll for streamed reply fragments
    ///
    /// Call this regularly while a reply is in flight. Events are
    /// applied in arrival order. Returns true if there was activity.
    pub async fn poll_streaming(&mut self) -> bool {
        let updates: Vec<StreamUpdate> = {
            let Some(rx) = self.streaming_rx.as_mut() else {
                return false;
            };

            let mut collected = Vec::new();
            loop {
                match rx.try_recv() {
                    Ok(update) => {
                        let terminal =
                            matches!(update, StreamUpdate::Done | StreamUpdate::Failed(_));
                        collected.push(update);
                        if terminal {
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        // transport task gone without a terminal update
                        collected.push(StreamUpdate::Done);
                        break;
                    }
                }
            }
            collected
        };

        if updates.is_empty() {
            return false;
        }

        for update in updates {
            match update {
                StreamUpdate::Event(event) => self.apply_stream_event(event).await,
                StreamUpdate::Done => self.finish_stream().await,
                StreamUpdate::Failed(error) => {
                    self.streaming_rx = None;
                    self.fail_send(&error).await;
                }
            }
        }
        true
    }

    /// Apply one decoded stream event
    async fn apply_stream_event(&mut self, event: StreamEvent) {
        if event.code != 0 {
            tracing::warn!(code = event.code, message = ?event.message, "skipping stream event with non-zero code");
            return;
        }
        let EventData::Answer(payload) = event.data else {
            // keep-alive / end-marker control events carry no content
            return;
        };

        if self.state == ChatState::Sending {
            self.set_state(ChatState::Streaming).await;
        }
        if let Some(id) = payload.session_id.as_deref() {
            self.sessions.capture(id);
        }

        self.transcript.apply_fragment(&payload);

        if payload.answer.is_some() || payload.reference.is_some() {
            if let Some(turn) = self.current_reply() {
                self.send(ControllerMessage::AnswerUpdate {
                    content: turn.content,
                    citations: turn.citations,
                })
                .await;
            }
        }
    }

    /// Handle transport completion of the in-flight reply
    async fn finish_stream(&mut self) {
        self.streaming_rx = None;

        if let Some(turn) = self.current_reply() {
            self.send(ControllerMessage::StreamEnd {
                content: turn.content,
                citations: turn.citations,
            })
            .await;
        } else {
            self.notify(NotifyLevel::Warning, "The assistant returned no answer")
                .await;
        }
        self.set_state(ChatState::Idle).await;
    }

    /// Clone the in-flight assistant turn, if the last turn is one
    fn current_reply(&self) -> Option<ChatTurn> {
        self.transcript
            .last()
            .filter(|turn| turn.role == MessageRole::Assistant)
            .cloned()
    }

    /// Report a failed send and return to idle
    ///
    /// The optimistically-appended user turn stays; any partial reply
    /// text already shown stays too. No automatic retry.
    async fn fail_send(&mut self, error: &str) {
        self.set_state(ChatState::Error).await;
        self.send(ControllerMessage::StreamError {
            error: error.to_string(),
        })
        .await;
        self.notify(NotifyLevel::Error, &format!("Failed to send message: {error}"))
            .await;
        self.set_state(ChatState::Idle).await;
    }

    /// Reset the conversation
    ///
    /// Stops applying any in-flight reply, deletes the remote session
    /// best-effort, and clears local identity and transcript.
    pub async fn reset(&mut self) -> Result<(), ChatError> {
        self.streaming_rx = None;

        if let Some(assistant) = self.assistant.clone() {
            self.sessions.reset(&assistant.id).await;
        }
        self.transcript.clear();
        self.set_state(ChatState::Idle).await;
        self.send(ControllerMessage::TranscriptCleared).await;
        self.notify(NotifyLevel::Info, "Conversation reset").await;
        Ok(())
    }

    /// Send the session listing to the surface
    async fn list_sessions(&mut self) -> Result<(), ChatError> {
        let Some(assistant) = self.assistant.clone() else {
            return Ok(());
        };

        let mut query = ListQuery::default().with_page_size(self.config.page_size);
        if let Some(user_id) = &self.config.user_id {
            query = query.with_user(user_id);
        }

        match self.sessions.list(&assistant.id, &query).await {
            Ok(sessions) => {
                self.send(ControllerMessage::SessionList { sessions }).await;
            }
            Err(error) => {
                self.notify(NotifyLevel::Error, &format!("Failed to list sessions: {error}"))
                    .await;
            }
        }
        Ok(())
    }

    /// Delete a session, clearing the transcript when it is the current one
    async fn delete_session(&mut self, session_id: &str) -> Result<(), ChatError> {
        let Some(assistant) = self.assistant.clone() else {
            return Ok(());
        };

        let was_current = self.sessions.current_id().as_deref() == Some(session_id);
        match self.sessions.delete(&assistant.id, session_id).await {
            Ok(()) => {
                if was_current {
                    self.streaming_rx = None;
                    self.transcript.clear();
                    self.set_state(ChatState::Idle).await;
                    self.send(ControllerMessage::TranscriptCleared).await;
                }
                self.notify(NotifyLevel::Info, "Session deleted").await;
            }
            Err(error) => {
                self.notify(NotifyLevel::Error, &format!("Failed to delete session: {error}"))
                    .await;
            }
        }
        Ok(())
    }

    /// Set state and notify the surface
    async fn set_state(&mut self, state: ChatState) {
        self.state = state;
        self.send(ControllerMessage::State { state }).await;
    }

    /// Send a notification
    async fn notify(&self, level: NotifyLevel, message: &str) {
        self.send(ControllerMessage::Notify {
            level,
            message: message.to_string(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, message: ControllerMessage) {
        if let Err(error) = self.tx.send(message).await {
            tracing::warn!(%error, "failed to send message to surface");
        }
    }
}
