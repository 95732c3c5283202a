//! Daily challenge repository implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use draft_core::{
    Challenge, ChallengeEntry, ChallengeRepository, CreateChallengeRequest, Error, Result,
};

/// PostgreSQL implementation of ChallengeRepository.
#[derive(Clone)]
pub struct PgChallengeRepository {
    pool: Pool<Postgres>,
}

impl PgChallengeRepository {
    /// Create a new PgChallengeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChallengeRepository for PgChallengeRepository {
    async fn insert(&self, req: CreateChallengeRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO challenges (id, date, prompt, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(req.date)
        .bind(&req.prompt)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Error::InvalidInput(format!("A challenge already exists for {}", req.date))
            }
            _ => Error::Database(e),
        })?;
        Ok(id)
    }

    async fn fetch_for_date(&self, date: NaiveDate) -> Result<Option<Challenge>> {
        Ok(sqlx::query_as::<_, Challenge>(
            "SELECT id, date, prompt, created_at FROM challenges WHERE date = $1",
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn fetch(&self, id: Uuid) -> Result<Challenge> {
        sqlx::query_as::<_, Challenge>(
            "SELECT id, date, prompt, created_at FROM challenges WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("challenge {}", id)))
    }

    async fn upsert_entry(&self, challenge_id: Uuid, user_id: Uuid, content: &str) -> Result<Uuid> {
        let row = sqlx::query(
            "INSERT INTO challenge_entries (id, challenge_id, user_id, content, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (challenge_id, user_id) DO UPDATE SET content = EXCLUDED.content
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(challenge_id)
        .bind(user_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn list_entries(&self, challenge_id: Uuid) -> Result<Vec<ChallengeEntry>> {
        Ok(sqlx::query_as::<_, ChallengeEntry>(
            "SELECT id, challenge_id, user_id, content, created_at
             FROM challenge_entries WHERE challenge_id = $1 ORDER BY created_at ASC",
        )
        .bind(challenge_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
