//! Writing session HTTP handlers.
//!
//! Sessions belong to the user who opened them; segments accumulate until
//! the session is finished, at which point the flow statistics are computed
//! and stored.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::{require_document_action, ApiError, AppState, CurrentUser};
use draft_core::{
    compute_segment_flow, ActionPermission, FlowStats, SessionRepository, SessionSegment,
    StartSessionRequest, WritingSession,
};

/// Open a writing session against a document.
pub async fn start_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_document_action(
        &state,
        user_id,
        req.document_id,
        ActionPermission::EditDocumentVersion,
    )
    .await?;
    let id = state.db.sessions.start(user_id, req.document_id).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Append a timed segment to an open session.
pub async fn append_segment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(segment): Json<SessionSegment>,
) -> Result<StatusCode, ApiError> {
    if segment.ended_at < segment.started_at {
        return Err(ApiError::BadRequest(
            "segment ended_at precedes started_at".to_string(),
        ));
    }
    if segment.words_added < 0 {
        return Err(ApiError::BadRequest(
            "words_added must be non-negative".to_string(),
        ));
    }
    let session = state.db.sessions.fetch(id).await?;
    if session.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the session owner may append segments".to_string(),
        ));
    }
    state.db.sessions.append_segment(id, segment).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Close a session and return its flow statistics.
pub async fn finish_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowStats>, ApiError> {
    let session = state.db.sessions.fetch(id).await?;
    if session.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the session owner may finish the session".to_string(),
        ));
    }
    let flow = compute_segment_flow(&session.segments);
    state.db.sessions.finish(id, &flow).await?;
    Ok(Json(flow))
}

/// Fetch a session (owner only).
pub async fn get_session(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<WritingSession>, ApiError> {
    let session = state.db.sessions.fetch(id).await?;
    if session.user_id != user_id {
        return Err(ApiError::Forbidden(
            "Only the session owner may view the session".to_string(),
        ));
    }
    Ok(Json(session))
}
