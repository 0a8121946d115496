//! Answer gating.
//!
//! Two checks bracket generation:
//!
//! 1. **Before**: [`decide_answerability`] turns an empty retrieval into
//!    [`Answerability::Unanswerable`], which short-circuits to
//!    [`Answer::refusal`] without calling the model.
//! 2. **After**: [`finalize`] drops all sources when the model's answer is a
//!    refusal, even though context was retrieved.

use std::collections::BTreeSet;

use crate::models::{Answer, RetrievalResult, REFUSAL_MARKER};

/// Separator placed between retrieved segments in the context block.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Outcome of the pre-generation gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Answerability {
    Answerable(RetrievalResult),
    Unanswerable,
}

/// `Unanswerable` exactly when retrieval produced no records.
pub fn decide_answerability(result: Option<RetrievalResult>) -> Answerability {
    match result {
        Some(result) if !result.is_empty() => Answerability::Answerable(result),
        _ => Answerability::Unanswerable,
    }
}

/// Build the grounding context and the distinct source documents.
///
/// The context is every retrieved text, in retrieval order, separated by a
/// blank line. Sources are deduplicated and sorted by name.
pub fn build_context(result: &RetrievalResult) -> (String, Vec<String>) {
    let context = result.texts().collect::<Vec<_>>().join(CONTEXT_SEPARATOR);
    let sources: BTreeSet<&str> = result.sources().collect();
    (context, sources.into_iter().map(str::to_string).collect())
}

/// Whether generated text is a refusal.
pub fn is_refusal(text: &str) -> bool {
    text.contains(REFUSAL_MARKER)
}

/// Pair generated text with its sources, clearing them on refusal.
pub fn finalize(text: String, sources: Vec<String>) -> Answer {
    let sources = if is_refusal(&text) { Vec::new() } else { sources };
    Answer { text, sources }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RecordMatch, RecordMetadata, REFUSAL_SENTENCE};

    fn result(hits: &[(&str, &str)]) -> RetrievalResult {
        let matches = hits
            .iter()
            .enumerate()
            .map(|(i, (source, text))| RecordMatch {
                id: format!("{}_{}", source, i),
                text: text.to_string(),
                metadata: RecordMetadata {
                    source: source.to_string(),
                },
                score: 1.0 - i as f64 * 0.1,
            })
            .collect();
        RetrievalResult::from_matches(matches).unwrap()
    }

    #[test]
    fn test_none_is_unanswerable() {
        assert_eq!(decide_answerability(None), Answerability::Unanswerable);
    }

    #[test]
    fn test_hits_are_answerable() {
        let r = result(&[("a.txt", "x")]);
        assert_eq!(
            decide_answerability(Some(r.clone())),
            Answerability::Answerable(r)
        );
    }

    #[test]
    fn test_context_joined_in_retrieval_order() {
        let r = result(&[("b.txt", "second doc"), ("a.txt", "first doc")]);
        let (context, _) = build_context(&r);
        assert_eq!(context, "second doc\n\nfirst doc");
    }

    #[test]
    fn test_sources_deduplicated() {
        let r = result(&[("b.txt", "1"), ("a.txt", "2"), ("b.txt", "3")]);
        let (_, sources) = build_context(&r);
        assert_eq!(sources, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_refusal_clears_sources() {
        let answer = finalize(REFUSAL_SENTENCE.to_string(), vec!["a.txt".to_string()]);
        assert!(answer.sources.is_empty());
        assert_eq!(answer.text, REFUSAL_SENTENCE);
    }

    #[test]
    fn test_embedded_refusal_phrase_clears_sources() {
        let answer = finalize(
            "Sorry, I cannot answer this question from the text.".to_string(),
            vec!["a.txt".to_string()],
        );
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn test_grounded_answer_keeps_sources() {
        let answer = finalize(
            "Refunds are allowed within 30 days.".to_string(),
            vec!["policy.txt".to_string()],
        );
        assert_eq!(answer.sources, vec!["policy.txt"]);
    }
}
