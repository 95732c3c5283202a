//! Document version repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use draft_core::{CreateVersionRequest, DocumentVersion, Error, Result, VersionRepository};

/// PostgreSQL implementation of VersionRepository.
#[derive(Clone)]
pub struct PgVersionRepository {
    pool: Pool<Postgres>,
}

impl PgVersionRepository {
    /// Create a new PgVersionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionRepository for PgVersionRepository {
    async fn insert(&self, document_id: Uuid, req: CreateVersionRequest) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO document_versions (id, document_id, name, content, published, created_at, updated_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5)",
        )
        .bind(id)
        .bind(document_id)
        .bind(&req.name)
        .bind(&req.content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn fetch(&self, id: Uuid) -> Result<DocumentVersion> {
        sqlx::query_as::<_, DocumentVersion>(
            "SELECT id, document_id, name, content, published, created_at, updated_at
             FROM document_versions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::VersionNotFound(id))
    }

    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<DocumentVersion>> {
        Ok(sqlx::query_as::<_, DocumentVersion>(
            "SELECT id, document_id, name, content, published, created_at, updated_at
             FROM document_versions WHERE document_id = $1 ORDER BY created_at ASC",
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn rename(&self, id: Uuid, name: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE document_versions SET name = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::VersionNotFound(id));
        }
        Ok(())
    }

    async fn update_content(&self, id: Uuid, content: &str) -> Result<()> {
        let result = sqlx::query(
            "UPDATE document_versions SET content = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::VersionNotFound(id));
        }
        Ok(())
    }

    async fn publish(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE document_versions SET published = TRUE, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::VersionNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT document_id,
                    (SELECT COUNT(*) FROM document_versions v2
                     WHERE v2.document_id = document_versions.document_id) AS sibling_count
             FROM document_versions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(Error::VersionNotFound(id))?;

        let sibling_count: i64 = row.get("sibling_count");
        if sibling_count <= 1 {
            return Err(Error::InvalidInput(
                "Cannot delete the last remaining version of a document".to_string(),
            ));
        }

        sqlx::query("DELETE FROM document_versions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
