//! User HTTP handlers.
//!
//! The authentication provider lives in front of this service; these
//! endpoints only manage the user records the rest of the system references.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::{ApiError, AppState};
use draft_core::{CreateUserRequest, User, UserRepository};

/// Create a user record.
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if req.email.trim().is_empty() || req.display_name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "display_name and email are required".to_string(),
        ));
    }
    let id = state.db.users.insert(req).await?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Fetch a user by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.db.users.fetch(id).await?))
}
