//! Scratchpad journal HTTP handlers. Owner-only; no sharing surface.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState, CurrentUser};
use draft_core::{defaults, CreateJournalEntryRequest, JournalEntry, JournalRepository};

/// Query parameters for listing journal entries.
#[derive(Debug, Deserialize)]
pub struct ListJournalQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Append a journal entry.
pub async fn create_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateJournalEntryRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.body.trim().is_empty() || req.body.len() > defaults::JOURNAL_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "body must be 1-{} characters",
            defaults::JOURNAL_MAX_LENGTH
        )));
    }
    let id = state.db.journal.insert(user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List the caller's journal entries, newest first.
pub async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListJournalQuery>,
) -> Result<Json<Vec<JournalEntry>>, ApiError> {
    let limit = query.limit.unwrap_or(defaults::PAGE_LIMIT).clamp(1, 500);
    let offset = query.offset.unwrap_or(defaults::PAGE_OFFSET).max(0);
    Ok(Json(
        state.db.journal.list_for_user(user_id, limit, offset).await?,
    ))
}

/// Delete one of the caller's journal entries.
pub async fn delete_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let entry = state.db.journal.fetch(id).await?;
    if entry.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the author may delete a journal entry".to_string(),
        ));
    }
    state.db.journal.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
