//! The similarity index handle.
//!
//! [`IndexClient`] pairs a [`Store`] with an [`Embedder`] and exposes the
//! text-level index contract: upsert records by text, query by text. It is
//! constructed explicitly and shared (via `Arc`) between the indexer and the
//! retriever; there is no process-wide index.

use std::sync::Arc;

use anyhow::Result;

use crate::embedding::Embedder;
use crate::models::{IndexedRecord, RecordMatch, SourceSummary};
use crate::store::Store;

/// Default number of texts sent to the embedder per call.
pub const DEFAULT_EMBED_BATCH: usize = 64;

/// Text-level access to a persisted similarity index.
pub struct IndexClient {
    store: Arc<dyn Store>,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl IndexClient {
    pub fn new(store: Arc<dyn Store>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            store,
            embedder,
            batch_size: DEFAULT_EMBED_BATCH,
        }
    }

    /// Override the embedding batch size (minimum 1).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Embed and upsert records. Existing ids are overwritten; an empty
    /// slice is a no-op.
    pub async fn upsert(&self, records: &[IndexedRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let vectors = self.embed_records(records).await?;
        self.store
            .upsert_records(records, &vectors, self.embedder.model_name())
            .await
    }

    /// Embed `records`, then atomically replace every record of `source`
    /// with them.
    pub async fn replace_source(&self, source: &str, records: &[IndexedRecord]) -> Result<()> {
        let vectors = self.embed_records(records).await?;
        self.store
            .replace_source(source, records, &vectors, self.embedder.model_name())
            .await
    }

    pub async fn delete_source(&self, source: &str) -> Result<u64> {
        self.store.delete_source(source).await
    }

    /// Top-`k` records most similar to `text`, most similar first.
    ///
    /// An empty index (or `k == 0`) returns no matches without calling the
    /// embedder.
    pub async fn query(&self, text: &str, k: usize) -> Result<Vec<RecordMatch>> {
        if k == 0 || self.store.count().await? == 0 {
            return Ok(Vec::new());
        }
        let query_vec = self.embedder.embed_query(text).await?;
        self.store.vector_search(&query_vec, k).await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count().await
    }

    pub async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        self.store.list_sources().await
    }

    async fn embed_records(&self, records: &[IndexedRecord]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(records.len());
        for batch in records.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|r| r.text.clone()).collect();
            let embedded = self.embedder.embed(&texts).await?;
            if embedded.len() != texts.len() {
                anyhow::bail!(
                    "embedder '{}' returned {} vectors for {} texts",
                    self.embedder.model_name(),
                    embedded.len(),
                    texts.len()
                );
            }
            vectors.extend(embedded);
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordMetadata;
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts calls and embeds by whether the text mentions "cat".
    struct CountingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        fn model_name(&self) -> &str {
            "counting"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|t| {
                    if t.contains("cat") {
                        vec![1.0, 0.0]
                    } else {
                        vec![0.0, 1.0]
                    }
                })
                .collect())
        }
    }

    fn client() -> (IndexClient, Arc<CountingEmbedder>) {
        let embedder = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
        });
        let client = IndexClient::new(Arc::new(InMemoryStore::new()), embedder.clone());
        (client, embedder)
    }

    fn record(id: &str, text: &str) -> IndexedRecord {
        IndexedRecord {
            id: id.to_string(),
            chunk_index: 0,
            text: text.to_string(),
            metadata: RecordMetadata {
                source: "doc.txt".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let (client, embedder) = client();
        let hits = client.query("anything", 3).await.unwrap();
        assert!(hits.is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_upsert_is_noop() {
        let (client, embedder) = client();
        client.upsert(&[]).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_returns_nearest_first() {
        let (client, _) = client();
        client
            .upsert(&[record("d_0", "a dog barks"), record("d_1", "the cat sleeps")])
            .await
            .unwrap();
        let hits = client.query("where is the cat", 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "d_1");
    }

    #[tokio::test]
    async fn test_upsert_batches_embedding_calls() {
        let (client, embedder) = client();
        let client = client.with_batch_size(2);
        let records: Vec<_> = (0..5).map(|i| record(&format!("d_{}", i), "x")).collect();
        client.upsert(&records).await.unwrap();
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert_eq!(client.count().await.unwrap(), 5);
    }
}
