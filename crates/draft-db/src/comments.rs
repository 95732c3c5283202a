//! Version comment repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use draft_core::{Comment, CommentRepository, Error, Result};

/// PostgreSQL implementation of CommentRepository.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: Pool<Postgres>,
}

impl PgCommentRepository {
    /// Create a new PgCommentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn insert(&self, version_id: Uuid, author_id: Uuid, body: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO comments
                 (id, document_version_id, author_id, body, resolved, resolved_by, created_at)
             VALUES ($1, $2, $3, $4, FALSE, NULL, $5)",
        )
        .bind(id)
        .bind(version_id)
        .bind(author_id)
        .bind(body)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<Comment> {
        sqlx::query_as::<_, Comment>(
            "SELECT id, document_version_id, author_id, body, resolved, resolved_by, created_at
             FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("comment {}", id)))
    }

    async fn list_for_version(&self, version_id: Uuid) -> Result<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            "SELECT id, document_version_id, author_id, body, resolved, resolved_by, created_at
             FROM comments WHERE document_version_id = $1 ORDER BY created_at ASC",
        )
        .bind(version_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn resolve(&self, id: Uuid, resolved_by: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE comments SET resolved = TRUE, resolved_by = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(resolved_by)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("comment {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("comment {}", id)));
        }
        Ok(())
    }
}
