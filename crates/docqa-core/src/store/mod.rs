//! Storage abstraction for the similarity index.
//!
//! The [`Store`] trait defines the persistence operations the indexing and
//! retrieval pipeline needs, enabling pluggable backends (SQLite in the app
//! crate, [`memory::InMemoryStore`] for tests).
//!
//! Stores hold records together with their embedding vectors; computing the
//! vectors is the job of an [`Embedder`](crate::embedding::Embedder), and the
//! two are combined by [`IndexClient`](crate::index::IndexClient).

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{IndexedRecord, RecordMatch, SourceSummary};

/// Abstract storage backend for indexed records.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert_records`](Store::upsert_records) | Insert records, overwriting existing ids |
/// | [`replace_source`](Store::replace_source) | Drop all records of a document, then insert |
/// | [`delete_source`](Store::delete_source) | Drop all records of a document |
/// | [`vector_search`](Store::vector_search) | Top-k cosine similarity search |
/// | [`count`](Store::count) | Number of stored records |
/// | [`list_sources`](Store::list_sources) | Per-document record counts |
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert records with their vectors. A record whose id already exists
    /// replaces the stored one. `vectors` must be parallel to `records`.
    async fn upsert_records(
        &self,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()>;

    /// Atomically remove every record whose source is `source` and insert
    /// `records`.
    async fn replace_source(
        &self,
        source: &str,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()>;

    /// Remove every record of `source`, returning how many were removed.
    async fn delete_source(&self, source: &str) -> Result<u64>;

    /// Return up to `limit` records ordered by descending cosine similarity
    /// to `query_vec`.
    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<RecordMatch>>;

    /// Total number of stored records.
    async fn count(&self) -> Result<u64>;

    /// Record counts grouped by source, sorted by source name.
    async fn list_sources(&self) -> Result<Vec<SourceSummary>>;
}

/// Check that `vectors` lines up with `records`.
pub fn ensure_parallel(records: &[IndexedRecord], vectors: &[Vec<f32>]) -> Result<()> {
    if records.len() != vectors.len() {
        anyhow::bail!(
            "record/vector count mismatch: {} records, {} vectors",
            records.len(),
            vectors.len()
        );
    }
    Ok(())
}
