//! Match persistence implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use barterly_core::{Error, MatchRepository, MatchResult, MatchStatus, Result, StoredMatch};

/// PostgreSQL implementation of [`MatchRepository`].
pub struct PgMatchRepository {
    pool: PgPool,
}

impl PgMatchRepository {
    /// Create a new match repository over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const MATCH_COLUMNS: &str = "id, seeker_id, helper_id, skill_offered, skill_needed, match_score, \
                             confidence, explanation, is_reciprocal, metadata, status, \
                             created_at, updated_at";

fn row_to_match(row: sqlx::postgres::PgRow) -> Result<StoredMatch> {
    let status: String = row.get("status");
    let status = status.parse::<MatchStatus>().map_err(Error::Internal)?;

    Ok(StoredMatch {
        id: row.get("id"),
        seeker_id: row.get("seeker_id"),
        helper_id: row.get("helper_id"),
        skill_offered: row.get("skill_offered"),
        skill_needed: row.get("skill_needed"),
        match_score: row.get("match_score"),
        confidence: row.get("confidence"),
        explanation: row.get("explanation"),
        is_reciprocal: row.get("is_reciprocal"),
        metadata: row.get("metadata"),
        status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl MatchRepository for PgMatchRepository {
    async fn create_match(&self, result: &MatchResult) -> Result<StoredMatch> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let status = MatchStatus::Pending;

        sqlx::query(
            "INSERT INTO skill_match
                 (id, seeker_id, helper_id, skill_offered, skill_needed, match_score,
                  confidence, explanation, is_reciprocal, metadata, status,
                  created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(id)
        .bind(result.seeker_id)
        .bind(result.helper_id)
        .bind(&result.skill_offered)
        .bind(&result.skill_needed)
        .bind(result.match_score)
        .bind(result.confidence)
        .bind(&result.explanation)
        .bind(result.is_reciprocal)
        .bind(&result.metadata)
        .bind(status.to_string())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(StoredMatch {
            id,
            seeker_id: result.seeker_id,
            helper_id: result.helper_id,
            skill_offered: result.skill_offered.clone(),
            skill_needed: result.skill_needed.clone(),
            match_score: result.match_score,
            confidence: result.confidence,
            explanation: result.explanation.clone(),
            is_reciprocal: result.is_reciprocal,
            metadata: result.metadata.clone(),
            status,
            created_at: now,
            updated_at: now,
        })
    }

    async fn check_existing_match(
        &self,
        seeker_id: Uuid,
        helper_id: Uuid,
    ) -> Result<Option<StoredMatch>> {
        let row = sqlx::query(&format!(
            "SELECT {}
             FROM skill_match
             WHERE seeker_id = $1 AND helper_id = $2 AND status <> 'rejected'
             ORDER BY created_at DESC
             LIMIT 1",
            MATCH_COLUMNS
        ))
        .bind(seeker_id)
        .bind(helper_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_match).transpose()
    }

    async fn update_match_status(
        &self,
        match_id: Uuid,
        status: MatchStatus,
    ) -> Result<Option<StoredMatch>> {
        let row = sqlx::query(&format!(
            "UPDATE skill_match
             SET status = $2, updated_at = $3
             WHERE id = $1
             RETURNING {}",
            MATCH_COLUMNS
        ))
        .bind(match_id)
        .bind(status.to_string())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_match).transpose()
    }

    async fn get_matches_for_user(
        &self,
        user_id: Uuid,
        status: Option<MatchStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<StoredMatch>> {
        let rows = sqlx::query(&format!(
            "SELECT {}
             FROM skill_match
             WHERE seeker_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4",
            MATCH_COLUMNS
        ))
        .bind(user_id)
        .bind(status.map(|s| s.to_string()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_match).collect()
    }
}
