//! Embedding cache store implementation.

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use barterly_core::{
    EmbeddingCacheEntry, EmbeddingCacheRepository, Error, ItemKind, Result,
};

/// PostgreSQL implementation of [`EmbeddingCacheRepository`].
///
/// Upserts are keyed on `(owner_id, kind, ref_id)`; a conflicting write
/// replaces the vector, hash, and model while leaving `created_at` alone.
pub struct PgEmbeddingCacheRepository {
    pool: PgPool,
}

impl PgEmbeddingCacheRepository {
    /// Create a new cache repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmbeddingCacheRepository for PgEmbeddingCacheRepository {
    async fn get_by_owner_kind_ref(
        &self,
        owner_id: Uuid,
        kind: ItemKind,
        ref_id: &str,
    ) -> Result<Option<EmbeddingCacheEntry>> {
        let row = sqlx::query(
            "SELECT owner_id, kind, ref_id, model, text_hash, dimension, vector,
                    created_at, updated_at
             FROM embedding_cache
             WHERE owner_id = $1 AND kind = $2 AND ref_id = $3",
        )
        .bind(owner_id)
        .bind(kind.to_string())
        .bind(ref_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|row| {
            let kind: String = row.get("kind");
            let kind = kind
                .parse::<ItemKind>()
                .map_err(Error::Internal)?;
            let vector: Vector = row.get("vector");

            Ok(EmbeddingCacheEntry {
                owner_id: row.get("owner_id"),
                kind,
                ref_id: row.get("ref_id"),
                model: row.get("model"),
                text_hash: row.get("text_hash"),
                dimension: row.get("dimension"),
                vector,
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            })
        })
        .transpose()
    }

    async fn upsert(&self, entry: EmbeddingCacheEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO embedding_cache
                 (owner_id, kind, ref_id, model, text_hash, dimension, vector,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             ON CONFLICT (owner_id, kind, ref_id) DO UPDATE SET
                 model = EXCLUDED.model,
                 text_hash = EXCLUDED.text_hash,
                 dimension = EXCLUDED.dimension,
                 vector = EXCLUDED.vector,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(entry.owner_id)
        .bind(entry.kind.to_string())
        .bind(&entry.ref_id)
        .bind(&entry.model)
        .bind(&entry.text_hash)
        .bind(entry.dimension)
        .bind(&entry.vector)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }
}
