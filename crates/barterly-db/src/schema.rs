//! Table definitions for the matching store.

use sqlx::PgPool;

use barterly_core::{Error, Result};

/// DDL for the three tables the matching core reads and writes.
///
/// `vector` requires the pgvector extension; the dimension is left open so
/// one table serves any configured embedding model.
pub const SCHEMA_SQL: &str = r#"
CREATE EXTENSION IF NOT EXISTS vector;

CREATE TABLE IF NOT EXISTS app_user (
    id              UUID PRIMARY KEY,
    username        TEXT NOT NULL,
    skills_offered  JSONB NOT NULL DEFAULT '[]',
    skills_needed   JSONB NOT NULL DEFAULT '[]',
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS embedding_cache (
    owner_id    UUID NOT NULL,
    kind        TEXT NOT NULL,
    ref_id      TEXT NOT NULL,
    model       TEXT NOT NULL,
    text_hash   TEXT NOT NULL,
    dimension   INTEGER NOT NULL,
    vector      vector NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (owner_id, kind, ref_id)
);

CREATE TABLE IF NOT EXISTS skill_match (
    id              UUID PRIMARY KEY,
    seeker_id       UUID NOT NULL,
    helper_id       UUID NOT NULL,
    skill_offered   TEXT NOT NULL,
    skill_needed    TEXT NOT NULL,
    match_score     REAL NOT NULL,
    confidence      REAL NOT NULL,
    explanation     TEXT NOT NULL DEFAULT '',
    is_reciprocal   BOOLEAN NOT NULL DEFAULT FALSE,
    metadata        JSONB NOT NULL DEFAULT '{}',
    status          TEXT NOT NULL DEFAULT 'pending',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_app_user_active ON app_user (is_active);
CREATE INDEX IF NOT EXISTS idx_skill_match_seeker ON skill_match (seeker_id, created_at DESC);
"#;

/// Apply the schema, creating any missing tables.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA_SQL.split(';') {
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(Error::Database)?;
    }
    Ok(())
}
