//! In-memory [`Store`] implementation for tests and embedding hosts.
//!
//! Records live in a `Vec` behind `std::sync::RwLock`, kept in insertion
//! order. Vector search is brute-force cosine similarity over all records.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{IndexedRecord, RecordMatch, SourceSummary};

use super::{ensure_parallel, Store};

struct StoredRecord {
    record: IndexedRecord,
    vector: Vec<f32>,
}

/// In-memory store.
pub struct InMemoryStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Stored record ids in insertion order.
    pub fn ids(&self) -> Vec<String> {
        let records = self.records.read().unwrap();
        records.iter().map(|sr| sr.record.id.clone()).collect()
    }

    /// Look up a stored record by id.
    pub fn get(&self, id: &str) -> Option<IndexedRecord> {
        let records = self.records.read().unwrap();
        records
            .iter()
            .find(|sr| sr.record.id == id)
            .map(|sr| sr.record.clone())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn upsert_locked(stored: &mut Vec<StoredRecord>, records: &[IndexedRecord], vectors: &[Vec<f32>]) {
    for (record, vector) in records.iter().zip(vectors.iter()) {
        let entry = StoredRecord {
            record: record.clone(),
            vector: vector.clone(),
        };
        match stored.iter_mut().find(|sr| sr.record.id == record.id) {
            Some(existing) => *existing = entry,
            None => stored.push(entry),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_records(
        &self,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        _model: &str,
    ) -> Result<()> {
        ensure_parallel(records, vectors)?;
        let mut stored = self.records.write().unwrap();
        upsert_locked(&mut stored, records, vectors);
        Ok(())
    }

    async fn replace_source(
        &self,
        source: &str,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        _model: &str,
    ) -> Result<()> {
        ensure_parallel(records, vectors)?;
        let mut stored = self.records.write().unwrap();
        stored.retain(|sr| sr.record.metadata.source != source);
        upsert_locked(&mut stored, records, vectors);
        Ok(())
    }

    async fn delete_source(&self, source: &str) -> Result<u64> {
        let mut stored = self.records.write().unwrap();
        let before = stored.len();
        stored.retain(|sr| sr.record.metadata.source != source);
        Ok((before - stored.len()) as u64)
    }

    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<RecordMatch>> {
        let stored = self.records.read().unwrap();
        let mut matches: Vec<RecordMatch> = stored
            .iter()
            .map(|sr| RecordMatch {
                id: sr.record.id.clone(),
                text: sr.record.text.clone(),
                metadata: sr.record.metadata.clone(),
                score: cosine_similarity(query_vec, &sr.vector) as f64,
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().unwrap().len() as u64)
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let stored = self.records.read().unwrap();
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for sr in stored.iter() {
            *counts.entry(sr.record.metadata.source.as_str()).or_default() += 1;
        }
        Ok(counts
            .into_iter()
            .map(|(source, records)| SourceSummary {
                source: source.to_string(),
                records,
            })
            .collect())
    }
}
