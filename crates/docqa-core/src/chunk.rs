//! Sentence-unit text chunker.
//!
//! Splits raw document text into ordered, non-empty chunks of at most
//! `chunk_size` characters. Splitting happens only between sentence-like
//! units, so a unit is never cut in half.
//!
//! # Algorithm
//!
//! 1. Replace every `\n` with a space.
//! 2. Split on `". "` (approximate sentence boundaries).
//! 3. Trim each unit, skip empty ones, and re-append the `.` consumed by the
//!    split when the unit does not already end with one.
//! 4. Greedily append units to the current buffer. When the joined buffer
//!    would exceed `chunk_size` and the buffer is non-empty, flush it (units
//!    joined by single spaces) and start a new buffer with the unit.
//! 5. Flush whatever remains.
//!
//! A single unit longer than `chunk_size` becomes a chunk of its own and is
//! not truncated.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::split_text;
//!
//! let chunks = split_text("Refunds are allowed within 30 days. No refunds after 30 days.", 600);
//! assert_eq!(chunks, vec!["Refunds are allowed within 30 days. No refunds after 30 days."]);
//! ```

use crate::models::Segment;

/// Default chunk budget, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 600;

/// Split text into sentence-aligned chunks of at most `chunk_size` characters.
///
/// # Guarantees
///
/// - Empty or whitespace-only input yields no chunks.
/// - Chunks preserve the original unit order; joining them with a single
///   space yields the normalized unit sequence.
/// - A chunk longer than `chunk_size` consists of exactly one unit.
pub fn split_text(text: &str, chunk_size: usize) -> Vec<String> {
    let normalized = text.replace('\n', " ");

    let mut chunks = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_len = 0usize;

    for raw in normalized.split(". ") {
        let unit = raw.trim();
        if unit.is_empty() {
            continue;
        }
        let unit = if unit.ends_with('.') {
            unit.to_string()
        } else {
            format!("{}.", unit)
        };
        let unit_len = unit.chars().count();

        // +1 for the joining space
        let would_be = if current.is_empty() {
            unit_len
        } else {
            current_len + 1 + unit_len
        };

        if would_be > chunk_size && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_len = unit_len;
        } else {
            current_len = would_be;
        }
        current.push(unit);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Chunk a document and assign each chunk its stable identifier.
///
/// Identifiers are `<name>_<i>` with `i` counting from 0, so re-chunking the
/// same document name always produces the same id sequence.
pub fn segment_document(name: &str, text: &str, chunk_size: usize) -> Vec<Segment> {
    split_text(text, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(i, text)| Segment {
            id: segment_id(name, i),
            source: name.to_string(),
            chunk_index: i as i64,
            text,
        })
        .collect()
}

/// Identifier of the `index`-th segment of document `name`.
pub fn segment_id(name: &str, index: usize) -> String {
    format!("{}_{}", name, index)
}
