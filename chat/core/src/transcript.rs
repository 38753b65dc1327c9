//! Conversation Transcript
//!
//! The ordered list of exchanged turns and the reducer that folds
//! streamed fragments into it. The backend sends cumulative answer text
//! per fragment, so applying a fragment replaces the in-flight assistant
//! turn's content outright instead of appending a delta. Citations are
//! merged with first-seen deduplication.
//!
//! Invariants: turns are never reordered, user turns are never mutated,
//! and a fragment never opens a second assistant turn next to an
//! existing one: it folds into the last turn when that turn is an
//! assistant reply.

use crate::backend::types::{AnswerPayload, Message, MessageRole};
use crate::reference::{merge_citations, message_citations, normalize_live, DocumentRef};

/// One turn of the conversation, with normalized citations
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatTurn {
    /// Who sent this turn
    pub role: MessageRole,
    /// Turn content
    pub content: String,
    /// Source documents cited by this turn
    pub citations: Vec<DocumentRef>,
}

/// The ordered conversation history
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a transcript from backend-stored messages, normalizing
    /// whichever citation shape each message carries
    pub fn from_history(messages: &[Message]) -> Self {
        let turns = messages
            .iter()
            .map(|message| ChatTurn {
                role: message.role,
                content: message.content.clone(),
                citations: message_citations(message),
            })
            .collect();
        Self { turns }
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(ChatTurn {
            role: MessageRole::User,
            content: content.into(),
            citations: Vec::new(),
        });
    }

    /// Fold one streamed fragment into the transcript
    ///
    /// Replaces the last assistant turn's content (cumulative answer
    /// semantics) and merges its citations; opens a new assistant turn
    /// only when the last turn is not an assistant reply. A fragment
    /// with no answer text never opens an empty assistant turn.
    pub fn apply_fragment(&mut self, payload: &AnswerPayload) {
        let incoming = payload.reference.as_ref().map(normalize_live);

        if let Some(turn) = self
            .turns
            .last_mut()
            .filter(|turn| turn.role == MessageRole::Assistant)
        {
            if let Some(answer) = &payload.answer {
                turn.content.clone_from(answer);
            }
            if let Some(refs) = incoming {
                merge_citations(&mut turn.citations, refs);
            }
            return;
        }

        let Some(answer) = &payload.answer else {
            tracing::debug!("ignoring fragment with no answer text and no open reply");
            return;
        };
        self.turns.push(ChatTurn {
            role: MessageRole::Assistant,
            content: answer.clone(),
            citations: incoming.unwrap_or_default(),
        });
    }

    /// All turns in insertion order
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The most recent turn
    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    /// Number of turns
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript holds no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop all turns
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{Reference, ReferenceChunk};

    fn fragment(answer: &str) -> AnswerPayload {
        AnswerPayload {
            answer: Some(answer.to_string()),
            ..Default::default()
        }
    }

    fn reference(doc_id: &str) -> Reference {
        Reference {
            total: 1,
            chunks: vec![ReferenceChunk {
                document_id: doc_id.to_string(),
                document_name: format!("{doc_id}.pdf"),
                dataset_id: "ds1".to_string(),
                ..Default::default()
            }],
            doc_aggs: Vec::new(),
        }
    }

    #[test]
    fn test_cumulative_fragments_yield_single_assistant_turn() {
        let mut transcript = Transcript::new();
        transcript.push_user("question");

        transcript.apply_fragment(&fragment("A"));
        transcript.apply_fragment(&fragment("AB"));
        transcript.apply_fragment(&AnswerPayload {
            answer: Some("ABC".to_string()),
            reference: Some(reference("d1")),
            ..Default::default()
        });

        assert_eq!(transcript.len(), 2);
        let last = transcript.last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert_eq!(last.content, "ABC");
        assert_eq!(last.citations.len(), 1);
        assert_eq!(last.citations[0].document_id, "d1");
    }

    #[test]
    fn test_answerless_fragment_never_opens_empty_turn() {
        let mut transcript = Transcript::new();
        transcript.push_user("question");

        transcript.apply_fragment(&AnswerPayload {
            session_id: Some("s1".to_string()),
            ..Default::default()
        });
        assert_eq!(transcript.len(), 1);

        // once a reply is open, a reference-only fragment still merges
        transcript.apply_fragment(&fragment("hello"));
        transcript.apply_fragment(&AnswerPayload {
            reference: Some(reference("d1")),
            ..Default::default()
        });

        let last = transcript.last().unwrap();
        assert_eq!(last.content, "hello");
        assert_eq!(last.citations.len(), 1);
    }

    #[test]
    fn test_citations_merge_first_seen_across_fragments() {
        let mut transcript = Transcript::new();
        transcript.push_user("question");

        transcript.apply_fragment(&AnswerPayload {
            answer: Some("x".to_string()),
            reference: Some(reference("d1")),
            ..Default::default()
        });
        transcript.apply_fragment(&AnswerPayload {
            answer: Some("xy".to_string()),
            reference: Some(Reference {
                total: 2,
                chunks: vec![
                    ReferenceChunk {
                        document_id: "d1".to_string(),
                        document_name: "renamed.pdf".to_string(),
                        dataset_id: "ds1".to_string(),
                        ..Default::default()
                    },
                    ReferenceChunk {
                        document_id: "d2".to_string(),
                        document_name: "d2.pdf".to_string(),
                        dataset_id: "ds1".to_string(),
                        ..Default::default()
                    },
                ],
                doc_aggs: Vec::new(),
            }),
            ..Default::default()
        });

        let citations = &transcript.last().unwrap().citations;
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].document_name, "d1.pdf");
    }

    #[test]
    fn test_user_turns_never_mutated() {
        let mut transcript = Transcript::new();
        transcript.push_user("question");
        transcript.apply_fragment(&fragment("answer"));
        transcript.push_user("follow-up");
        transcript.apply_fragment(&fragment("second answer"));

        let contents: Vec<_> = transcript
            .turns()
            .iter()
            .map(|t| t.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec!["question", "answer", "follow-up", "second answer"]
        );
    }

    #[test]
    fn test_from_history_normalizes_both_citation_shapes() {
        let messages: Vec<Message> = serde_json::from_str(
            r#"[
                {"role":"user","content":"q"},
                {"role":"assistant","content":"a",
                 "reference":[{"document_id":"d1","document_name":"a.pdf","dataset_id":"ds"}]}
            ]"#,
        )
        .unwrap();

        let transcript = Transcript::from_history(&messages);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.last().unwrap().citations[0].document_id, "d1");
    }
}
