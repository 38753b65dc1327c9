//! RAGFlow Backend Implementation
//!
//! HTTP client for a RAGFlow-style retrieval-augmented chat backend.
//!
//! # API
//!
//! - `GET    /api/v1/chats` - list chat assistants
//! - `POST   /api/v1/chats/{id}/sessions` - create a session
//! - `GET    /api/v1/chats/{id}/sessions` - list sessions (paginated)
//! - `DELETE /api/v1/chats/{id}/sessions` - delete sessions by id
//! - `POST   /api/v1/chats/{id}/completions` - streamed completion
//!
//! Non-streaming replies share the `{code, message, data}` envelope; the
//! completion body is a stream of `data:`-prefixed JSON lines terminated
//! only by transport completion.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use super::traits::{ChatBackend, StreamUpdate};
use super::types::{
    ApiEnvelope, Assistant, CompletionRequest, CreateSessionRequest, ListQuery, SessionRecord,
};
use crate::config::ClientConfig;
use crate::error::ChatError;
use crate::sse::SseParser;

/// RAGFlow backend client
#[derive(Clone)]
pub struct RagflowBackend {
    /// Base URL without trailing slash
    base_url: String,
    /// Bearer token sent on every request
    api_key: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl RagflowBackend {
    /// Create a new backend client
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            api_key: api_key.into(),
            http_client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create from a [`ClientConfig`]
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            config.base_url.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Get the assistants endpoint URL
    fn chats_url(&self) -> String {
        format!("{}/api/v1/chats", self.base_url)
    }

    /// Get the sessions endpoint URL for an assistant
    fn sessions_url(&self, assistant_id: &str) -> String {
        format!("{}/{}/sessions", self.chats_url(), assistant_id)
    }

    /// Get the completions endpoint URL for an assistant
    fn completions_url(&self, assistant_id: &str) -> String {
        format!("{}/{}/completions", self.chats_url(), assistant_id)
    }

    /// Decode an enveloped response, mapping HTTP and envelope failures
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ChatError> {
        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<T> = response.json().await?;
        envelope.into_result()
    }

    /// Map a non-2xx response to [`ChatError::Remote`]
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChatError::Remote {
            code: i64::from(status.as_u16()),
            message: if body.is_empty() {
                status.to_string()
            } else {
                body
            },
        })
    }
}

#[async_trait]
impl ChatBackend for RagflowBackend {
    fn name(&self) -> &str {
        "RAGFlow"
    }

    async fn list_assistants(&self, query: &ListQuery) -> Result<Vec<Assistant>, ChatError> {
        let response = self
            .http_client
            .get(self.chats_url())
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn create_session(
        &self,
        assistant_id: &str,
        name: &str,
        user_id: Option<&str>,
    ) -> Result<SessionRecord, ChatError> {
        let request = CreateSessionRequest {
            name: name.to_string(),
            user_id: user_id.map(str::to_string),
        };

        let response = self
            .http_client
            .post(self.sessions_url(assistant_id))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn list_sessions(
        &self,
        assistant_id: &str,
        query: &ListQuery,
    ) -> Result<Vec<SessionRecord>, ChatError> {
        let response = self
            .http_client
            .get(self.sessions_url(assistant_id))
            .bearer_auth(&self.api_key)
            .query(query)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn delete_sessions(&self, assistant_id: &str, ids: &[String]) -> Result<(), ChatError> {
        let response = self
            .http_client
            .delete(self.sessions_url(assistant_id))
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({ "ids": ids }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let envelope: ApiEnvelope<serde_json::Value> = response.json().await?;
        envelope.check_code()
    }

    async fn stream_completion(
        &self,
        assistant_id: &str,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<mpsc::Receiver<StreamUpdate>, ChatError> {
        let request = CompletionRequest {
            question: question.to_string(),
            stream: true,
            session_id: session_id.map(str::to_string),
        };

        let response = self
            .http_client
            .post(self.completions_url(assistant_id))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        let response = Self::check_status(response).await?;

        let (tx, rx) = mpsc::channel(100);
        let mut stream = response.bytes_stream();

        // Read the body off-task; the receiver applies events at its own
        // pace and dropping it stops this task via the closed channel.
        tokio::spawn(async move {
            let mut parser = SseParser::new();
            // bytes not yet decodable as UTF-8 (a chunk may end mid-character)
            let mut pending: Vec<u8> = Vec::new();

            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        pending.extend_from_slice(&bytes);
                        let valid = match std::str::from_utf8(&pending) {
                            Ok(_) => pending.len(),
                            Err(error) => error.valid_up_to(),
                        };
                        if valid == 0 {
                            continue;
                        }
                        let text = String::from_utf8_lossy(&pending[..valid]).into_owned();
                        pending.drain(..valid);

                        for event in parser.feed(&text) {
                            if tx.send(StreamUpdate::Event(event)).await.is_err() {
                                // Receiver dropped, stop streaming
                                return;
                            }
                        }
                    }
                    Err(error) => {
                        let _ = tx.send(StreamUpdate::Failed(error.to_string())).await;
                        return;
                    }
                }
            }

            for event in parser.finish() {
                if tx.send(StreamUpdate::Event(event)).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamUpdate::Done).await;
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_urls() {
        let backend = RagflowBackend::new(
            "http://localhost:9380/",
            "key",
            Duration::from_secs(600),
        );
        assert_eq!(backend.chats_url(), "http://localhost:9380/api/v1/chats");
        assert_eq!(
            backend.sessions_url("a1"),
            "http://localhost:9380/api/v1/chats/a1/sessions"
        );
        assert_eq!(
            backend.completions_url("a1"),
            "http://localhost:9380/api/v1/chats/a1/completions"
        );
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let config = ClientConfig {
            base_url: "http://example.com/".to_string(),
            ..Default::default()
        };
        let backend = RagflowBackend::from_config(&config);
        assert_eq!(backend.base_url, "http://example.com");
    }
}
