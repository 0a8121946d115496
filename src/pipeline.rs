//! End-to-end question answering.
//!
//! A [`Pipeline`] owns the indexer, retriever and generator, all sharing one
//! [`IndexClient`]. [`Pipeline::answer`] implements the two-stage refusal:
//! no retrieved segments means a fixed refusal without calling the model,
//! and a model answer that itself refuses carries no sources.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use docqa_core::embedding::Embedder;
use docqa_core::gate::{build_context, decide_answerability, finalize, Answerability};
use docqa_core::generate::{CompletionProvider, Generator, SamplingConfig};
use docqa_core::index::IndexClient;
use docqa_core::models::{Answer, SourceSummary};
use docqa_core::retrieve::Retriever;
use docqa_core::store::Store;

use crate::config::Config;
use crate::db;
use crate::embedding::create_embedder;
use crate::generate::create_completion_provider;
use crate::ingest::{IngestReport, Indexer};
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Record counts for the whole index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStatus {
    pub records: u64,
    pub sources: Vec<SourceSummary>,
}

pub struct Pipeline {
    indexer: Indexer,
    retriever: Retriever,
    generator: Generator,
    top_k: usize,
}

impl Pipeline {
    /// Assemble a pipeline from injected backends.
    pub fn new(
        store: Arc<dyn Store>,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn CompletionProvider>,
        config: &Config,
    ) -> Self {
        let index = Arc::new(
            IndexClient::new(store, embedder).with_batch_size(config.embedding.batch_size),
        );
        Self::with_index(index, provider, config.generation.sampling(), config)
    }

    fn with_index(
        index: Arc<IndexClient>,
        provider: Arc<dyn CompletionProvider>,
        sampling: SamplingConfig,
        config: &Config,
    ) -> Self {
        Self {
            indexer: Indexer::new(
                Arc::clone(&index),
                config.ingest.chunk_size,
                config.ingest.replace_existing,
            ),
            retriever: Retriever::new(index),
            generator: Generator::new(provider, sampling),
            top_k: config.retrieval.top_k,
        }
    }

    /// Open the SQLite index named in the config (creating it if needed) and
    /// build the configured embedding and generation backends.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let pool = db::connect(config).await?;
        migrate::apply_schema(&pool).await?;

        let store: Arc<dyn Store> = Arc::new(SqliteStore::new(pool));
        let embedder = create_embedder(&config.embedding)?;
        let provider = create_completion_provider(&config.generation)?;
        tracing::debug!(
            embedder = embedder.model_name(),
            generator = provider.model_name(),
            "pipeline ready"
        );

        Ok(Self::new(store, embedder, provider, config))
    }

    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    /// Ingest every document directly inside `dir`.
    pub async fn ingest_all(&self, dir: &Path) -> IngestReport {
        self.indexer.ingest_all(dir).await
    }

    /// Answer `question` from the indexed documents, or refuse.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        let retrieved = self.retriever.search(question, self.top_k).await?;

        let result = match decide_answerability(retrieved) {
            Answerability::Unanswerable => {
                tracing::debug!("no segments retrieved; refusing without generation");
                return Ok(Answer::refusal());
            }
            Answerability::Answerable(result) => result,
        };

        let (context, sources) = build_context(&result);
        tracing::debug!(segments = result.len(), ?sources, "generating answer");
        let text = self.generator.generate(question, &context).await?;

        Ok(finalize(text, sources))
    }

    pub async fn status(&self) -> Result<IndexStatus> {
        let index = self.indexer.index();
        Ok(IndexStatus {
            records: index.count().await?,
            sources: index.list_sources().await?,
        })
    }
}
