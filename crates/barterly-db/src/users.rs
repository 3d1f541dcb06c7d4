//! User directory implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use barterly_core::{Error, Result, SkillDescriptor, User, UserDirectory};

/// PostgreSQL implementation of [`UserDirectory`].
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    /// Create a new directory over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: sqlx::postgres::PgRow) -> Result<User> {
    let offered: serde_json::Value = row.get("skills_offered");
    let needed: serde_json::Value = row.get("skills_needed");
    let skills_offered: Vec<SkillDescriptor> = serde_json::from_value(offered)?;
    let skills_needed: Vec<SkillDescriptor> = serde_json::from_value(needed)?;

    Ok(User {
        id: row.get("id"),
        username: row.get("username"),
        skills_offered,
        skills_needed,
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

const USER_COLUMNS: &str =
    "id, username, skills_offered, skills_needed, is_active, created_at, updated_at";

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM app_user WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(row_to_user).transpose()
    }

    async fn get_active_users(&self, limit: i64, exclude: Option<Uuid>) -> Result<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {}
             FROM app_user
             WHERE is_active AND ($2::uuid IS NULL OR id <> $2)
             ORDER BY created_at, id
             LIMIT $1",
            USER_COLUMNS
        ))
        .bind(limit)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn get_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM app_user WHERE id = ANY($1)",
            USER_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(row_to_user).collect()
    }
}
