//! Version comment HTTP handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::{require_document_access, require_document_action, ApiError, AppState, CurrentUser};
use draft_core::{
    defaults, ActionPermission, Comment, CommentRepository, CreateCommentRequest,
    VersionRepository,
};

/// Create a comment on a version.
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(version_id): Path<Uuid>,
    Json(req): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.body.trim().is_empty() || req.body.len() > defaults::COMMENT_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "body must be 1-{} characters",
            defaults::COMMENT_MAX_LENGTH
        )));
    }
    let version = state.db.versions.fetch(version_id).await?;
    require_document_action(
        &state,
        user_id,
        version.document_id,
        ActionPermission::CommentOnVersion,
    )
    .await?;
    let id = state.db.comments.insert(version_id, user_id, &req.body).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List a version's comments.
pub async fn list_comments(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(version_id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let version = state.db.versions.fetch(version_id).await?;
    require_document_access(&state, user_id, version.document_id).await?;
    Ok(Json(state.db.comments.list_for_version(version_id).await?))
}

/// Mark a comment resolved.
pub async fn resolve_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let comment = state.db.comments.fetch(id).await?;
    let version = state.db.versions.fetch(comment.document_version_id).await?;
    require_document_action(
        &state,
        user_id,
        version.document_id,
        ActionPermission::ResolveComment,
    )
    .await?;
    state.db.comments.resolve(id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a comment. The author may always delete their own; otherwise the
/// resolver must grant ResolveComment.
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let comment = state.db.comments.fetch(id).await?;
    if comment.author_id != user_id {
        let version = state.db.versions.fetch(comment.document_version_id).await?;
        require_document_action(
            &state,
            user_id,
            version.document_id,
            ActionPermission::ResolveComment,
        )
        .await?;
    }
    state.db.comments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
