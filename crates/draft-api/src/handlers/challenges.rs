//! Daily writing challenge HTTP handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::{ApiError, AppState, CurrentUser};
use draft_core::{
    Challenge, ChallengeEntry, ChallengeRepository, CreateChallengeEntryRequest,
    CreateChallengeRequest,
};

/// Seed a challenge prompt for a date.
pub async fn create_challenge(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Json(req): Json<CreateChallengeRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt is required".to_string()));
    }
    let id = state.db.challenges.insert(req).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Today's challenge, if one has been seeded.
pub async fn todays_challenge(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
) -> Result<Json<Challenge>, ApiError> {
    let today = Utc::now().date_naive();
    state
        .db
        .challenges
        .fetch_for_date(today)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No challenge for {}", today)))
}

/// Submit (or replace) the caller's entry for a challenge.
pub async fn submit_entry(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(challenge_id): Path<Uuid>,
    Json(req): Json<CreateChallengeEntryRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content is required".to_string()));
    }
    // 404 before insert when the challenge does not exist
    state.db.challenges.fetch(challenge_id).await?;
    let id = state
        .db
        .challenges
        .upsert_entry(challenge_id, user_id, &req.content)
        .await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List a challenge's entries.
pub async fn list_entries(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Path(challenge_id): Path<Uuid>,
) -> Result<Json<Vec<ChallengeEntry>>, ApiError> {
    state.db.challenges.fetch(challenge_id).await?;
    Ok(Json(state.db.challenges.list_entries(challenge_id).await?))
}
