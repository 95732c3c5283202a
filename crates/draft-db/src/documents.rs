//! Document repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use draft_core::{
    CreateDocumentRequest, Document, DocumentRepository, Error, Result,
};

/// PostgreSQL implementation of DocumentRepository.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    /// Create a new PgDocumentRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, owner_id: Uuid, req: CreateDocumentRequest) -> Result<(Uuid, Uuid)> {
        let document_id = Uuid::new_v4();
        let version_id = Uuid::new_v4();
        let now = Utc::now();

        // Document and its initial version land atomically
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO documents (id, owner_id, title, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $4)",
        )
        .bind(document_id)
        .bind(owner_id)
        .bind(&req.title)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO document_versions (id, document_id, name, content, published, created_at, updated_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5)",
        )
        .bind(version_id)
        .bind(document_id)
        .bind("First draft")
        .bind(&req.content)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        info!(
            subsystem = "db",
            document_id = %document_id,
            user_id = %owner_id,
            "Document created"
        );
        Ok((document_id, version_id))
    }

    async fn fetch(&self, id: Uuid) -> Result<Document> {
        sqlx::query_as::<_, Document>(
            "SELECT id, owner_id, title, created_at, updated_at, deleted_at
             FROM documents WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::DocumentNotFound(id))
    }

    async fn rename(&self, id: Uuid, title: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET title = $2, updated_at = $3
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET deleted_at = $2 WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Document>> {
        Ok(sqlx::query_as::<_, Document>(
            "SELECT DISTINCT d.id, d.owner_id, d.title, d.created_at, d.updated_at, d.deleted_at
             FROM documents d
             LEFT JOIN user_document_permissions p ON p.document_id = d.id
             WHERE d.deleted_at IS NULL AND (d.owner_id = $1 OR p.user_id = $1)
             ORDER BY d.updated_at DESC
             LIMIT $2 OFFSET $3",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?)
    }
}
