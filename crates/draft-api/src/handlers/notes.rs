//! Shared note HTTP handlers.
//!
//! Notes carry their own three-role scope (owner/admin/editor); reviewer
//! roles are not recognized at Note scope and a grant attempt with one is
//! rejected up front rather than silently resolving to nothing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::{require_note_action, ApiError, AppState, CurrentUser};
use draft_core::{
    defaults, ActionPermission, CreateNoteRequest, Note, NoteRepository, PermissionRepository,
    Role,
};

/// Request body for updating a note.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Request body for sharing a note.
#[derive(Debug, Deserialize)]
pub struct ShareNoteRequest {
    pub user_id: Uuid,
    pub role: Role,
}

/// Create a note.
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.title.trim().is_empty() || req.title.len() > defaults::TITLE_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "title must be 1-{} characters",
            defaults::TITLE_MAX_LENGTH
        )));
    }
    let id = state.db.notes.insert(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Fetch a note the caller can access.
pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    let note = state.db.notes.fetch(id).await?;
    let roles = state.db.permissions.roles_for_note(user_id, id).await?;
    if roles.is_empty() {
        return Err(ApiError::Forbidden(
            "You do not have access to this note".to_string(),
        ));
    }
    Ok(Json(note))
}

/// Rename and/or edit a note.
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNoteRequest>,
) -> Result<StatusCode, ApiError> {
    if req.title.is_none() && req.content.is_none() {
        return Err(ApiError::BadRequest(
            "Provide title and/or content to update".to_string(),
        ));
    }

    if let Some(ref title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".to_string()));
        }
        require_note_action(&state, user_id, id, ActionPermission::RenameNote).await?;
        state.db.notes.rename(id, title).await?;
    }

    if let Some(ref content) = req.content {
        require_note_action(&state, user_id, id, ActionPermission::EditNote).await?;
        state.db.notes.update_content(id, content).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Delete a note.
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_note_action(&state, user_id, id, ActionPermission::DeleteNote).await?;
    state.db.notes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant (or replace) a role for another user on this note.
pub async fn share_note(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareNoteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    // Note scope only recognizes owner/admin/editor
    if matches!(req.role, Role::Reviewer | Role::LeadReviewer) {
        return Err(ApiError::BadRequest(format!(
            "Role {} is not valid at note scope",
            req.role
        )));
    }
    require_note_action(&state, user_id, id, ActionPermission::ShareNote).await?;

    let note = state.db.notes.fetch(id).await?;
    if req.user_id == note.owner_id {
        return Err(ApiError::BadRequest(
            "The owner already holds every note permission".to_string(),
        ));
    }

    let grant_id = state
        .db
        .permissions
        .grant_note_role(req.user_id, id, req.role)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": grant_id })),
    ))
}
