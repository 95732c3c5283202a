//! Document HTTP handlers: CRUD and role-based sharing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::{require_document_access, require_document_action, ApiError, AppState, CurrentUser};
use draft_core::{
    defaults, ActionPermission, CreateDocumentRequest, Document, DocumentRepository,
    PermissionRepository, ShareDocumentRequest,
};

/// Query parameters for listing documents.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Request body for renaming a document.
#[derive(Debug, Deserialize)]
pub struct RenameDocumentRequest {
    pub title: String,
}

/// Create a document with its initial version.
pub async fn create_document(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.title.trim().is_empty() || req.title.len() > defaults::TITLE_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "title must be 1-{} characters",
            defaults::TITLE_MAX_LENGTH
        )));
    }
    let (document_id, version_id) = state.db.documents.insert(user_id, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": document_id,
            "initial_version_id": version_id,
        })),
    ))
}

/// List documents the caller owns or has a grant on.
pub async fn list_documents(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let limit = query.limit.unwrap_or(defaults::PAGE_LIMIT).clamp(1, 500);
    let offset = query.offset.unwrap_or(defaults::PAGE_OFFSET).max(0);
    Ok(Json(
        state.db.documents.list_for_user(user_id, limit, offset).await?,
    ))
}

/// Fetch a document the caller can access.
pub async fn get_document(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError> {
    let document = state.db.documents.fetch(id).await?;
    require_document_access(&state, user_id, id).await?;
    Ok(Json(document))
}

/// Rename a document.
pub async fn rename_document(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameDocumentRequest>,
) -> Result<StatusCode, ApiError> {
    if req.title.trim().is_empty() || req.title.len() > defaults::TITLE_MAX_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "title must be 1-{} characters",
            defaults::TITLE_MAX_LENGTH
        )));
    }
    require_document_action(&state, user_id, id, ActionPermission::RenameDocument).await?;
    state.db.documents.rename(id, &req.title).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Soft-delete a document.
pub async fn delete_document(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_document_action(&state, user_id, id, ActionPermission::DeleteDocument).await?;
    state.db.documents.soft_delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant (or replace) a role for another user on this document or one of
/// its versions.
pub async fn share_document(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ShareDocumentRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    require_document_action(&state, user_id, id, ActionPermission::ShareDocument).await?;

    // The document must exist and, for version-scope grants, the version
    // must belong to it.
    let document = state.db.documents.fetch(id).await?;
    if req.user_id == document.owner_id {
        return Err(ApiError::BadRequest(
            "The owner already holds every document permission".to_string(),
        ));
    }
    if let Some(version_id) = req.document_version_id {
        use draft_core::VersionRepository;
        let version = state.db.versions.fetch(version_id).await?;
        if version.document_id != id {
            return Err(ApiError::BadRequest(
                "Version does not belong to this document".to_string(),
            ));
        }
    }

    let grant_id = state
        .db
        .permissions
        .grant_document_role(req.user_id, id, req.document_version_id, req.role)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": grant_id })),
    ))
}

/// Remove every grant a user holds on this document.
pub async fn revoke_share(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path((id, target_user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    require_document_action(&state, user_id, id, ActionPermission::ShareDocument).await?;
    state
        .db
        .permissions
        .revoke_document_roles(target_user_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
