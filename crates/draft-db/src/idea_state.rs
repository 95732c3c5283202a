//! Idea-linkage state storage with optimistic concurrency.
//!
//! One row per document holds the whole state blob as JSONB plus a revision
//! counter. Every store names the revision it read; a mismatch means a
//! concurrent writer got there first and the caller must reload rather than
//! clobber.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use draft_core::{Error, IdeaLinkageState, IdeaStateRepository, Result};

/// PostgreSQL implementation of IdeaStateRepository.
#[derive(Clone)]
pub struct PgIdeaStateRepository {
    pool: Pool<Postgres>,
}

impl PgIdeaStateRepository {
    /// Create a new PgIdeaStateRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdeaStateRepository for PgIdeaStateRepository {
    async fn load(&self, document_id: Uuid) -> Result<Option<(IdeaLinkageState, i64)>> {
        let row = sqlx::query(
            "SELECT state, revision FROM idea_linkage_state WHERE document_id = $1",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let value: JsonValue = row.get("state");
                let revision: i64 = row.get("revision");
                let state: IdeaLinkageState = serde_json::from_value(value)?;
                Ok(Some((state, revision)))
            }
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        document_id: Uuid,
        state: &IdeaLinkageState,
        expected: Option<i64>,
    ) -> Result<i64> {
        let value = serde_json::to_value(state)?;

        match expected {
            None => {
                let result = sqlx::query(
                    "INSERT INTO idea_linkage_state (document_id, revision, state, updated_at)
                     VALUES ($1, 1, $2, $3)
                     ON CONFLICT (document_id) DO NOTHING",
                )
                .bind(document_id)
                .bind(&value)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(Error::Conflict(format!(
                        "linkage state for document {} was created concurrently",
                        document_id
                    )));
                }
                Ok(1)
            }
            Some(expected_revision) => {
                let row = sqlx::query(
                    "UPDATE idea_linkage_state
                     SET state = $2, revision = revision + 1, updated_at = $3
                     WHERE document_id = $1 AND revision = $4
                     RETURNING revision",
                )
                .bind(document_id)
                .bind(&value)
                .bind(Utc::now())
                .bind(expected_revision)
                .fetch_optional(&self.pool)
                .await?;

                match row {
                    Some(row) => Ok(row.get("revision")),
                    None => {
                        debug!(
                            subsystem = "db",
                            component = "idea_state",
                            document_id = %document_id,
                            expected_revision = expected_revision,
                            "Compare-and-swap lost to a concurrent writer"
                        );
                        Err(Error::Conflict(format!(
                            "linkage state revision {} for document {} is stale",
                            expected_revision, document_id
                        )))
                    }
                }
            }
        }
    }
}
