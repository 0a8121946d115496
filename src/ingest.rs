//! Document ingestion: read → chunk → embed → store.
//!
//! [`Indexer::ingest`] turns one file into an [`IngestBatch`];
//! [`Indexer::add`] embeds and writes it; [`Indexer::ingest_all`] runs both
//! over every file in a directory, recording per-file failures in an
//! [`IngestReport`] instead of aborting.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use walkdir::WalkDir;

use docqa_core::chunk::segment_document;
use docqa_core::index::IndexClient;
use docqa_core::models::{IndexedRecord, RecordMetadata};

use crate::extract::{read_document, ReadError};

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("{file}: {source}")]
    Read {
        file: String,
        #[source]
        source: ReadError,
    },
    #[error("{file}: index update failed: {error:#}")]
    Index { file: String, error: anyhow::Error },
}

/// The records produced from one document, as parallel columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestBatch {
    pub source: String,
    pub ids: Vec<String>,
    pub texts: Vec<String>,
    pub metadatas: Vec<RecordMetadata>,
}

impl IngestBatch {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn into_records(self) -> Vec<IndexedRecord> {
        self.ids
            .into_iter()
            .zip(self.texts)
            .zip(self.metadatas)
            .enumerate()
            .map(|(i, ((id, text), metadata))| IndexedRecord {
                id,
                chunk_index: i as i64,
                text,
                metadata,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedFile {
    pub name: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedFile {
    pub name: String,
    pub error: String,
}

/// Outcome of a directory ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub ingested: Vec<IngestedFile>,
    pub failed: Vec<FailedFile>,
    /// Directory entries that were not regular files.
    pub skipped: usize,
}

impl IngestReport {
    pub fn total_chunks(&self) -> usize {
        self.ingested.iter().map(|f| f.chunks).sum()
    }
}

pub struct Indexer {
    index: Arc<IndexClient>,
    chunk_size: usize,
    replace_existing: bool,
}

impl Indexer {
    pub fn new(index: Arc<IndexClient>, chunk_size: usize, replace_existing: bool) -> Self {
        Self {
            index,
            chunk_size,
            replace_existing,
        }
    }

    pub fn index(&self) -> &Arc<IndexClient> {
        &self.index
    }

    /// Read and chunk one file. Nothing is written to the index.
    pub fn ingest(&self, path: &Path) -> Result<IngestBatch, IngestError> {
        let file = file_name(path);
        let text = read_document(path).map_err(|source| IngestError::Read {
            file: file.clone(),
            source,
        })?;

        let mut batch = IngestBatch {
            source: file.clone(),
            ..Default::default()
        };
        for segment in segment_document(&file, &text, self.chunk_size) {
            batch.ids.push(segment.id);
            batch.texts.push(segment.text);
            batch.metadatas.push(RecordMetadata {
                source: segment.source,
            });
        }
        Ok(batch)
    }

    /// Embed and store a batch. An empty batch is a no-op.
    ///
    /// With `replace_existing`, every earlier record of the batch's source is
    /// removed first; otherwise records are upserted by id and trailing
    /// records from a longer earlier version remain.
    pub async fn add(&self, batch: IngestBatch) -> Result<(), IngestError> {
        if batch.is_empty() {
            return Ok(());
        }

        let file = batch.source.clone();
        let records = batch.into_records();
        let result = if self.replace_existing {
            self.index.replace_source(&file, &records).await
        } else {
            self.index.upsert(&records).await
        };
        result.map_err(|error| IngestError::Index { file, error })
    }

    /// Ingest every regular file directly inside `dir`, in name order.
    ///
    /// A missing directory yields an empty report. Failures are logged and
    /// recorded per file; they never stop the loop.
    pub async fn ingest_all(&self, dir: &Path) -> IngestReport {
        let mut report = IngestReport::default();

        if !dir.is_dir() {
            tracing::info!(dir = %dir.display(), "upload directory not found; nothing to ingest");
            return report;
        }

        for entry in WalkDir::new(dir)
            .follow_links(true)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let name = e.path().map(file_name).unwrap_or_default();
                    tracing::warn!(file = %name, error = %e, "failed to read directory entry");
                    report.failed.push(FailedFile {
                        name,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                report.skipped += 1;
                continue;
            }

            let name = file_name(entry.path());
            match self.ingest_one(entry.path()).await {
                Ok(chunks) => {
                    tracing::info!(chunks, "Ingested: {}", name);
                    report.ingested.push(IngestedFile { name, chunks });
                }
                Err(e) => {
                    tracing::warn!("Failed to ingest {}", e);
                    report.failed.push(FailedFile {
                        name,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn ingest_one(&self, path: &Path) -> Result<usize, IngestError> {
        let batch = self.ingest(path)?;
        let chunks = batch.len();
        if batch.is_empty() && self.replace_existing {
            self.index
                .delete_source(&batch.source)
                .await
                .map_err(|error| IngestError::Index {
                    file: batch.source.clone(),
                    error,
                })?;
            return Ok(0);
        }
        self.add(batch).await?;
        Ok(chunks)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
