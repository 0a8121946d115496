//! Core data models used throughout docqa.
//!
//! These types represent the segments, indexed records, retrieval results and
//! answers that flow through the ingestion and query pipeline.

use serde::{Deserialize, Serialize};

/// The fixed sentence returned when a question cannot be answered from the
/// indexed documents.
pub const REFUSAL_SENTENCE: &str = "I cannot answer this from the provided document.";

/// Substring that identifies a refusal inside a generated answer.
pub const REFUSAL_MARKER: &str = "I cannot answer this";

/// A contiguous span of document text produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// `<document-name>_<chunk_index>`.
    pub id: String,
    /// Name of the originating document (its filename).
    pub source: String,
    /// Ordinal within the document, starting at 0.
    pub chunk_index: i64,
    pub text: String,
}

/// Metadata attached to every indexed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMetadata {
    pub source: String,
}

/// A segment as stored in the similarity index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub id: String,
    pub chunk_index: i64,
    pub text: String,
    pub metadata: RecordMetadata,
}

impl From<Segment> for IndexedRecord {
    fn from(segment: Segment) -> Self {
        Self {
            id: segment.id,
            chunk_index: segment.chunk_index,
            text: segment.text,
            metadata: RecordMetadata {
                source: segment.source,
            },
        }
    }
}

/// One hit returned by a similarity query.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordMatch {
    pub id: String,
    pub text: String,
    pub metadata: RecordMetadata,
    /// Cosine similarity between the query and the record vectors.
    pub score: f64,
}

/// Ordered matches for one query, most similar first. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalResult {
    matches: Vec<RecordMatch>,
}

impl RetrievalResult {
    /// Wraps a non-empty match list; returns `None` for an empty one.
    pub fn from_matches(matches: Vec<RecordMatch>) -> Option<Self> {
        if matches.is_empty() {
            None
        } else {
            Some(Self { matches })
        }
    }

    pub fn matches(&self) -> &[RecordMatch] {
        &self.matches
    }

    /// Retrieved texts in retrieval order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.text.as_str())
    }

    /// Source label of each hit, in retrieval order (may repeat).
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.metadata.source.as_str())
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Final answer for a question, paired with the documents it was drawn from.
///
/// Serializes to the `{"answer": ..., "sources": [...]}` response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    pub sources: Vec<String>,
}

impl Answer {
    /// The refusal answer: [`REFUSAL_SENTENCE`] with no sources.
    pub fn refusal() -> Self {
        Self {
            text: REFUSAL_SENTENCE.to_string(),
            sources: Vec::new(),
        }
    }

    pub fn is_refusal(&self) -> bool {
        self.text.contains(REFUSAL_MARKER)
    }
}

/// Record count for one indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSummary {
    pub source: String,
    pub records: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, source: &str) -> RecordMatch {
        RecordMatch {
            id: id.to_string(),
            text: format!("text of {}", id),
            metadata: RecordMetadata {
                source: source.to_string(),
            },
            score: 0.5,
        }
    }

    #[test]
    fn empty_matches_are_not_a_result() {
        assert!(RetrievalResult::from_matches(Vec::new()).is_none());
    }

    #[test]
    fn result_preserves_order() {
        let result =
            RetrievalResult::from_matches(vec![hit("b_0", "b.txt"), hit("a_0", "a.txt")]).unwrap();
        let ids: Vec<&str> = result.matches().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b_0", "a_0"]);
        assert_eq!(result.sources().collect::<Vec<_>>(), vec!["b.txt", "a.txt"]);
    }

    #[test]
    fn answer_serializes_as_response_shape() {
        let json = serde_json::to_value(Answer::refusal()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "answer": "I cannot answer this from the provided document.",
                "sources": []
            })
        );
    }

    #[test]
    fn segment_converts_to_record_with_source_metadata() {
        let record: IndexedRecord = Segment {
            id: "policy.txt_2".to_string(),
            source: "policy.txt".to_string(),
            chunk_index: 2,
            text: "No refunds.".to_string(),
        }
        .into();
        assert_eq!(record.metadata.source, "policy.txt");
        assert_eq!(record.chunk_index, 2);
    }
}
