//! Scratchpad journal repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use draft_core::{Error, JournalEntry, JournalRepository, Result};

/// PostgreSQL implementation of JournalRepository.
#[derive(Clone)]
pub struct PgJournalRepository {
    pool: Pool<Postgres>,
}

impl PgJournalRepository {
    /// Create a new PgJournalRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JournalRepository for PgJournalRepository {
    async fn insert(&self, user_id: Uuid, body: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO journal_entries (id, user_id, body, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(id)
        .bind(user_id)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<JournalEntry> {
        sqlx::query_as::<_, JournalEntry>(
            "SELECT id, user_id, body, created_at FROM journal_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("journal entry {}", id)))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<JournalEntry>> {
        Ok(sqlx::query_as::<_, JournalEntry>(
            "SELECT id, user_id, body, created_at FROM journal_entries
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM journal_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("journal entry {}", id)));
        }
        Ok(())
    }
}
