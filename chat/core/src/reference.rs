//! Citation Normalization
//!
//! The backend attaches citations to replies in two shapes (see
//! [`crate::backend::types`]). Both collapse to the same per-message
//! document list: deduplicated by document id, first appearance wins.

use serde::{Deserialize, Serialize};

use crate::backend::types::{Message, Reference, ReferenceItem};

/// A source document cited by an assistant reply
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Opaque document id
    pub document_id: String,
    /// Document display name
    pub document_name: String,
    /// Dataset the document belongs to
    pub dataset_id: String,
}

/// Normalize the streamed (live) citation shape
///
/// Entries without a document id are skipped; duplicates keep the
/// first-seen name.
pub fn normalize_live(reference: &Reference) -> Vec<DocumentRef> {
    let mut refs = Vec::new();
    merge(
        &mut refs,
        reference.chunks.iter().map(|chunk| DocumentRef {
            document_id: chunk.document_id.clone(),
            document_name: chunk.document_name.clone(),
            dataset_id: chunk.dataset_id.clone(),
        }),
    );
    refs
}

/// Normalize the session-history citation shape
pub fn normalize_historical(items: &[ReferenceItem]) -> Vec<DocumentRef> {
    let mut refs = Vec::new();
    merge(
        &mut refs,
        items.iter().map(|item| DocumentRef {
            document_id: item.document_id.clone(),
            document_name: item.document_name.clone(),
            dataset_id: item.dataset_id.clone(),
        }),
    );
    refs
}

/// Derive the document list for a wire message
///
/// Prefers the live shape, falls back to the historical shape, and
/// returns an empty list when neither is present.
pub fn message_citations(message: &Message) -> Vec<DocumentRef> {
    if let Some(reference) = &message.references {
        return normalize_live(reference);
    }
    if let Some(items) = &message.reference {
        return normalize_historical(items);
    }
    Vec::new()
}

/// Append incoming refs that are not already present
///
/// Used when successive stream fragments each carry citation metadata;
/// first-seen order and names are preserved across merges.
pub fn merge_citations(existing: &mut Vec<DocumentRef>, incoming: Vec<DocumentRef>) {
    merge(existing, incoming.into_iter());
}

fn merge(existing: &mut Vec<DocumentRef>, incoming: impl Iterator<Item = DocumentRef>) {
    for doc in incoming {
        if doc.document_id.is_empty() {
            continue;
        }
        if existing.iter().any(|d| d.document_id == doc.document_id) {
            continue;
        }
        existing.push(doc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::ReferenceChunk;

    fn chunk(id: &str, name: &str) -> ReferenceChunk {
        ReferenceChunk {
            document_id: id.to_string(),
            document_name: name.to_string(),
            dataset_id: "ds1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_duplicate_document_keeps_first_seen_name() {
        let reference = Reference {
            total: 2,
            chunks: vec![chunk("d1", "first.pdf"), chunk("d1", "renamed.pdf")],
            doc_aggs: Vec::new(),
        };

        let refs = normalize_live(&reference);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document_name, "first.pdf");
    }

    #[test]
    fn test_entries_without_document_id_are_skipped() {
        let reference = Reference {
            total: 2,
            chunks: vec![chunk("", "orphan.pdf"), chunk("d2", "kept.pdf")],
            doc_aggs: Vec::new(),
        };

        let refs = normalize_live(&reference);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document_id, "d2");
    }

    #[test]
    fn test_live_shape_preferred_over_historical() {
        let message: Message = serde_json::from_str(
            r#"{
                "role": "assistant",
                "content": "hi",
                "references": {"total":1,"chunks":[{"document_id":"live","document_name":"live.pdf","dataset_id":"ds"}]},
                "reference": [{"document_id":"old","document_name":"old.pdf","dataset_id":"ds"}]
            }"#,
        )
        .unwrap();

        let refs = message_citations(&message);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].document_id, "live");
    }

    #[test]
    fn test_no_citation_fields_yields_empty_list() {
        let message: Message =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert!(message_citations(&message).is_empty());
    }

    #[test]
    fn test_merge_preserves_order_across_fragments() {
        let mut refs = normalize_live(&Reference {
            total: 1,
            chunks: vec![chunk("d1", "a.pdf")],
            doc_aggs: Vec::new(),
        });
        merge_citations(
            &mut refs,
            normalize_live(&Reference {
                total: 2,
                chunks: vec![chunk("d1", "a-renamed.pdf"), chunk("d2", "b.pdf")],
                doc_aggs: Vec::new(),
            }),
        );

        let ids: Vec<_> = refs.iter().map(|d| d.document_id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d2"]);
        assert_eq!(refs[0].document_name, "a.pdf");
    }
}
