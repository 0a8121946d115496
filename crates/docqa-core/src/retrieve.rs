//! Top-k retrieval over the similarity index.

use std::sync::Arc;

use anyhow::Result;

use crate::index::IndexClient;
use crate::models::RetrievalResult;

/// Default number of segments retrieved per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Finds the segments most similar to a question.
pub struct Retriever {
    index: Arc<IndexClient>,
}

impl Retriever {
    pub fn new(index: Arc<IndexClient>) -> Self {
        Self { index }
    }

    /// Return the `k` most similar records to `query`, most similar first.
    ///
    /// Returns `Ok(None)` when the index yields no records at all; callers
    /// treat that as "unanswerable" rather than as an error.
    pub async fn search(&self, query: &str, k: usize) -> Result<Option<RetrievalResult>> {
        let matches = self.index.query(query, k).await?;
        tracing::debug!(hits = matches.len(), k, "similarity query finished");
        Ok(RetrievalResult::from_matches(matches))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::Embedder;
    use crate::models::{IndexedRecord, RecordMetadata};
    use crate::store::memory::InMemoryStore;
    use async_trait::async_trait;

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        fn model_name(&self) -> &str {
            "length"
        }
        fn dims(&self) -> usize {
            2
        }
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 10.0]).collect())
        }
    }

    fn retriever() -> (Retriever, Arc<IndexClient>) {
        let index = Arc::new(IndexClient::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(LengthEmbedder),
        ));
        (Retriever::new(index.clone()), index)
    }

    #[tokio::test]
    async fn test_empty_index_yields_none() {
        let (retriever, _) = retriever();
        assert!(retriever.search("anything", DEFAULT_TOP_K).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_caps_at_k() {
        let (retriever, index) = retriever();
        let records: Vec<IndexedRecord> = (0..5)
            .map(|i| IndexedRecord {
                id: format!("doc.txt_{}", i),
                chunk_index: i,
                text: "x".repeat(i as usize + 1),
                metadata: RecordMetadata {
                    source: "doc.txt".to_string(),
                },
            })
            .collect();
        index.upsert(&records).await.unwrap();

        let result = retriever.search("query", DEFAULT_TOP_K).await.unwrap().unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.sources().all(|s| s == "doc.txt"));
    }

    #[tokio::test]
    async fn test_zero_k_yields_none() {
        let (retriever, index) = retriever();
        index
            .upsert(&[IndexedRecord {
                id: "a_0".to_string(),
                chunk_index: 0,
                text: "a".to_string(),
                metadata: RecordMetadata {
                    source: "a".to_string(),
                },
            }])
            .await
            .unwrap();
        assert!(retriever.search("q", 0).await.unwrap().is_none());
    }
}
