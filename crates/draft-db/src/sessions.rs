//! Writing session repository implementation.
//!
//! Segments live in a JSONB array on the session row; the flow statistics
//! are written once when the session is closed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use draft_core::{
    Error, FlowStats, Result, SessionRepository, SessionSegment, WritingSession,
};

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn map_row(row: sqlx::postgres::PgRow) -> Result<WritingSession> {
        let segments_json: JsonValue = row.get("segments");
        let segments: Vec<SessionSegment> = serde_json::from_value(segments_json)?;
        let flow_json: Option<JsonValue> = row.get("flow");
        let flow: Option<FlowStats> = match flow_json {
            Some(value) => Some(serde_json::from_value(value)?),
            None => None,
        };
        let ended_at: Option<DateTime<Utc>> = row.get("ended_at");

        Ok(WritingSession {
            id: row.get("id"),
            user_id: row.get("user_id"),
            document_id: row.get("document_id"),
            started_at: row.get("started_at"),
            ended_at,
            segments,
            flow,
        })
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn start(&self, user_id: Uuid, document_id: Uuid) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO writing_sessions (id, user_id, document_id, started_at, segments)
             VALUES ($1, $2, $3, $4, '[]'::jsonb)",
        )
        .bind(id)
        .bind(user_id)
        .bind(document_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn append_segment(&self, id: Uuid, segment: SessionSegment) -> Result<()> {
        let segment_json = serde_json::to_value(&segment)?;
        let result = sqlx::query(
            "UPDATE writing_sessions
             SET segments = segments || jsonb_build_array($2::jsonb)
             WHERE id = $1 AND ended_at IS NULL",
        )
        .bind(id)
        .bind(segment_json)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::InvalidInput(format!(
                "session {} is closed or does not exist",
                id
            )));
        }
        Ok(())
    }

    async fn finish(&self, id: Uuid, flow: &FlowStats) -> Result<()> {
        let flow_json = serde_json::to_value(flow)?;
        let result = sqlx::query(
            "UPDATE writing_sessions SET ended_at = $2, flow = $3
             WHERE id = $1 AND ended_at IS NULL",
        )
        .bind(id)
        .bind(Utc::now())
        .bind(flow_json)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(Error::InvalidInput(format!(
                "session {} is closed or does not exist",
                id
            )));
        }
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<WritingSession> {
        let row = sqlx::query(
            "SELECT id, user_id, document_id, started_at, ended_at, segments, flow
             FROM writing_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("writing session {}", id)))?;
        Self::map_row(row)
    }

    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<WritingSession>> {
        let rows = sqlx::query(
            "SELECT id, user_id, document_id, started_at, ended_at, segments, flow
             FROM writing_sessions WHERE user_id = $1
             ORDER BY started_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::map_row).collect()
    }
}
