//! Document version HTTP handlers.
//!
//! Rename and content edits arrive through the same PATCH but gate on
//! different actions, matching the role tables.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::{require_document_access, require_document_action, ApiError, AppState, CurrentUser};
use draft_core::{
    ActionPermission, CreateVersionRequest, DocumentVersion, UpdateVersionRequest,
    VersionRepository,
};

/// Create an additional version of a document.
pub async fn create_version(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(req): Json<CreateVersionRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    require_document_action(
        &state,
        user_id,
        document_id,
        ActionPermission::CreateDocumentVersion,
    )
    .await?;
    let id = state.db.versions.insert(document_id, req).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// List a document's versions.
pub async fn list_versions(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
) -> Result<Json<Vec<DocumentVersion>>, ApiError> {
    require_document_access(&state, user_id, document_id).await?;
    Ok(Json(state.db.versions.list_for_document(document_id).await?))
}

/// Fetch a single version.
pub async fn get_version(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentVersion>, ApiError> {
    let version = state.db.versions.fetch(id).await?;
    require_document_access(&state, user_id, version.document_id).await?;
    Ok(Json(version))
}

/// Rename and/or edit a version.
pub async fn update_version(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateVersionRequest>,
) -> Result<StatusCode, ApiError> {
    if req.name.is_none() && req.content.is_none() {
        return Err(ApiError::BadRequest(
            "Provide name and/or content to update".to_string(),
        ));
    }
    let version = state.db.versions.fetch(id).await?;

    if let Some(ref name) = req.name {
        if name.trim().is_empty() {
            return Err(ApiError::BadRequest("name must not be empty".to_string()));
        }
        require_document_action(
            &state,
            user_id,
            version.document_id,
            ActionPermission::RenameDocumentVersion,
        )
        .await?;
        state.db.versions.rename(id, name).await?;
    }

    if let Some(ref content) = req.content {
        require_document_action(
            &state,
            user_id,
            version.document_id,
            ActionPermission::EditDocumentVersion,
        )
        .await?;
        state.db.versions.update_content(id, content).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Mark a version as published.
pub async fn publish_version(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let version = state.db.versions.fetch(id).await?;
    require_document_action(
        &state,
        user_id,
        version.document_id,
        ActionPermission::PublishDocumentVersion,
    )
    .await?;
    state.db.versions.publish(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete a version (the last version of a document cannot be deleted).
pub async fn delete_version(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let version = state.db.versions.fetch(id).await?;
    require_document_action(
        &state,
        user_id,
        version.document_id,
        ActionPermission::DeleteDocumentVersion,
    )
    .await?;
    state.db.versions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
