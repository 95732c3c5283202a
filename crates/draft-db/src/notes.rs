//! Shared note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use draft_core::{CreateNoteRequest, Error, Note, NoteRepository, Result};

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO notes (id, owner_id, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Note> {
        sqlx::query_as::<_, Note>(
            "SELECT id, owner_id, title, content, created_at, updated_at
             FROM notes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("note {}", id)))
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<()> {
        let result =
            sqlx::query("UPDATE notes SET content = $2, updated_at = $3 WHERE id = $1")
                .bind(id)
                .bind(content)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    async fn rename(&self, id: Uuid, title: &str) -> Result<()> {
        let result = sqlx::query("UPDATE notes SET title = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(title)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("note {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("note {}", id)));
        }
        Ok(())
    }
}
