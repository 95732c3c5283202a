//! Idea linkage HTTP handlers.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::{require_document_access, require_document_action, ApiError, AppState, CurrentUser};
use draft_core::{ActionPermission, IdeaLinkageState, LinkIdeasRequest, LinkageResponse};

/// Run a linkage pass over a document's idea nodes.
///
/// Re-embeds changed nodes, recomputes the similarity matrix, generates
/// explanations for newly linked pairs, and persists the state. Returns 429
/// when the caller's provider-call quota is exhausted and 409 when
/// concurrent passes exhaust the conflict retries.
pub async fn run_linkage(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
    Json(req): Json<LinkIdeasRequest>,
) -> Result<Json<LinkageResponse>, ApiError> {
    if req.inputs.iter().any(|input| input.node_id.trim().is_empty()) {
        return Err(ApiError::BadRequest(
            "node_id must not be empty".to_string(),
        ));
    }
    require_document_action(
        &state,
        user_id,
        document_id,
        ActionPermission::EditDocumentVersion,
    )
    .await?;

    let response = state
        .engine
        .link_ideas(user_id, document_id, &req.inputs, &req.all_node_ids)
        .await?;
    Ok(Json(response))
}

/// The stored linkage state for a document, if a pass has run.
pub async fn get_linkage(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(document_id): Path<Uuid>,
) -> Result<Json<IdeaLinkageState>, ApiError> {
    require_document_access(&state, user_id, document_id).await?;
    state
        .engine
        .stored_state(document_id)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("No linkage state for document {}", document_id))
        })
}
