//! SQLite-backed [`Store`] implementation.
//!
//! Records and their vectors live in one `records` table (see
//! [`migrate`](crate::migrate)). Vectors are little-endian f32 BLOBs and
//! similarity search is brute-force cosine over every row, which is adequate
//! for the document-set sizes this tool targets.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};

use docqa_core::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use docqa_core::models::{IndexedRecord, RecordMatch, RecordMetadata, SourceSummary};
use docqa_core::store::{ensure_parallel, Store};

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

async fn insert_records(
    tx: &mut Transaction<'_, Sqlite>,
    records: &[IndexedRecord],
    vectors: &[Vec<f32>],
    model: &str,
) -> Result<()> {
    let now = chrono::Utc::now().timestamp();

    for (record, vector) in records.iter().zip(vectors.iter()) {
        sqlx::query(
            r#"
            INSERT INTO records (id, source, chunk_index, text, embedding, model, dims, ingested_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                source = excluded.source,
                chunk_index = excluded.chunk_index,
                text = excluded.text,
                embedding = excluded.embedding,
                model = excluded.model,
                dims = excluded.dims,
                ingested_at = excluded.ingested_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.metadata.source)
        .bind(record.chunk_index)
        .bind(&record.text)
        .bind(vec_to_blob(vector))
        .bind(model)
        .bind(vector.len() as i64)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_records(
        &self,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        ensure_parallel(records, vectors)?;
        let mut tx = self.pool.begin().await?;
        insert_records(&mut tx, records, vectors, model).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn replace_source(
        &self,
        source: &str,
        records: &[IndexedRecord],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        ensure_parallel(records, vectors)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records WHERE source = ?")
            .bind(source)
            .execute(&mut *tx)
            .await?;

        insert_records(&mut tx, records, vectors, model).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_source(&self, source: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM records WHERE source = ?")
            .bind(source)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn vector_search(&self, query_vec: &[f32], limit: usize) -> Result<Vec<RecordMatch>> {
        let rows = sqlx::query("SELECT id, source, text, embedding FROM records")
            .fetch_all(&self.pool)
            .await?;

        let mut matches: Vec<RecordMatch> = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let similarity = cosine_similarity(query_vec, &blob_to_vec(&blob)) as f64;
                RecordMatch {
                    id: row.get("id"),
                    text: row.get("text"),
                    metadata: RecordMetadata {
                        source: row.get("source"),
                    },
                    score: similarity,
                }
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
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn list_sources(&self) -> Result<Vec<SourceSummary>> {
        let rows = sqlx::query(
            "SELECT source, COUNT(*) AS records FROM records GROUP BY source ORDER BY source",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let records: i64 = row.get("records");
                SourceSummary {
                    source: row.get("source"),
                    records: records as u64,
                }
            })
            .collect())
    }
}
