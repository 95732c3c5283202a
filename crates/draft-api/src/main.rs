//! Draft Zero HTTP API server.
//!
//! Wires the database, the inference backends, and the linkage engine into
//! an axum router. Authentication is delegated to the fronting proxy: the
//! caller's identity arrives as an `X-User-Id` header and every mutating
//! route gates through the role resolver.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use uuid::Uuid;

use draft_core::{any_has_permission, defaults, ActionPermission, PermissionRepository};
use draft_db::Database;
use draft_inference::{CostGuard, OpenAIBackend};
use draft_linkage::LinkageEngine;

mod handlers;

use handlers::{
    challenges, comments, documents, journal, linkage, notes, sessions, users, versions,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub engine: Arc<LinkageEngine>,
}

/// OpenAPI documentation metadata.
#[allow(dead_code)]
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Draft Zero API",
        version = "0.6.0",
        description = "Collaborative document writing with role-based sharing, writing challenges, session tracking, and semantic idea linkage"
    ),
    tags(
        (name = "Documents", description = "Document and version CRUD with role-based sharing"),
        (name = "Notes", description = "Shared notes with their own role scope"),
        (name = "Comments", description = "Version comments"),
        (name = "Challenges", description = "Daily writing challenges"),
        (name = "Sessions", description = "Writing session tracking and flow statistics"),
        (name = "Journal", description = "Scratchpad journal"),
        (name = "Linkage", description = "Semantic idea linkage"),
        (name = "System", description = "Health checks")
    )
)]
struct ApiDoc;

// =============================================================================
// AUTHENTICATED CALLER
// =============================================================================

/// The caller's user id, read from the `X-User-Id` header.
pub struct CurrentUser(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("Missing or invalid X-User-Id header".to_string())
            })?;
        Ok(CurrentUser(id))
    }
}

// =============================================================================
// PERMISSION GATES
// =============================================================================

/// Reject unless the caller holds a role granting `action` on the document.
pub async fn require_document_action(
    state: &AppState,
    user_id: Uuid,
    document_id: Uuid,
    action: ActionPermission,
) -> std::result::Result<(), ApiError> {
    let roles = state
        .db
        .permissions
        .roles_for_document(user_id, document_id)
        .await?;
    if any_has_permission(&roles, action) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Action {} is not permitted on this document",
            action
        )))
    }
}

/// Reject unless the caller holds a role granting `action` on the note.
pub async fn require_note_action(
    state: &AppState,
    user_id: Uuid,
    note_id: Uuid,
    action: ActionPermission,
) -> std::result::Result<(), ApiError> {
    let roles = state.db.permissions.roles_for_note(user_id, note_id).await?;
    if any_has_permission(&roles, action) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!(
            "Action {} is not permitted on this note",
            action
        )))
    }
}

/// Reject unless the caller holds ANY role on the document (read access).
pub async fn require_document_access(
    state: &AppState,
    user_id: Uuid,
    document_id: Uuid,
) -> std::result::Result<(), ApiError> {
    let roles = state
        .db
        .permissions
        .roles_for_document(user_id, document_id)
        .await?;
    if roles.is_empty() {
        Err(ApiError::Forbidden(
            "You do not have access to this document".to_string(),
        ))
    } else {
        Ok(())
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Database(draft_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    RateLimited(String),
}

impl From<draft_core::Error> for ApiError {
    fn from(err: draft_core::Error) -> Self {
        match &err {
            draft_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            draft_core::Error::DocumentNotFound(id) => {
                ApiError::NotFound(format!("document {}", id))
            }
            draft_core::Error::VersionNotFound(id) => {
                ApiError::NotFound(format!("document version {}", id))
            }
            draft_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            draft_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            draft_core::Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            draft_core::Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            draft_core::Error::RateLimited(msg) => ApiError::RateLimited(msg.clone()),
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// SYSTEM
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "draft-api",
    }))
}

// =============================================================================
// ROUTER / MAIN
// =============================================================================

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(users::create_user))
        .route("/users/:id", get(users::get_user))
        .route(
            "/documents",
            post(documents::create_document).get(documents::list_documents),
        )
        .route(
            "/documents/:id",
            get(documents::get_document)
                .patch(documents::rename_document)
                .delete(documents::delete_document),
        )
        .route("/documents/:id/share", post(documents::share_document))
        .route(
            "/documents/:id/share/:user_id",
            delete(documents::revoke_share),
        )
        .route(
            "/documents/:id/versions",
            post(versions::create_version).get(versions::list_versions),
        )
        .route(
            "/versions/:id",
            get(versions::get_version)
                .patch(versions::update_version)
                .delete(versions::delete_version),
        )
        .route("/versions/:id/publish", post(versions::publish_version))
        .route(
            "/versions/:id/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route("/comments/:id/resolve", post(comments::resolve_comment))
        .route("/comments/:id", delete(comments::delete_comment))
        .route("/challenges", post(challenges::create_challenge))
        .route("/challenges/today", get(challenges::todays_challenge))
        .route(
            "/challenges/:id/entries",
            post(challenges::submit_entry).get(challenges::list_entries),
        )
        .route("/sessions", post(sessions::start_session))
        .route("/sessions/:id", get(sessions::get_session))
        .route("/sessions/:id/segments", post(sessions::append_segment))
        .route("/sessions/:id/finish", post(sessions::finish_session))
        .route("/notes", post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/share", post(notes::share_note))
        .route(
            "/journal",
            post(journal::create_entry).get(journal::list_entries),
        )
        .route("/journal/:id", delete(journal::delete_entry))
        .route(
            "/documents/:id/linkage",
            post(linkage::run_linkage).get(linkage::get_linkage),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/draftzero".to_string());
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let backend = Arc::new(OpenAIBackend::from_env()?);
    let engine = Arc::new(LinkageEngine::new(
        backend.clone(),
        backend,
        Arc::new(db.idea_state.clone()),
        Arc::new(CostGuard::from_env()),
    ));

    let state = AppState { db, engine };
    let app = router(state);

    let port = defaults::env_u64("DRAFT_PORT", defaults::SERVER_PORT as u64) as u16;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(
        subsystem = "api",
        port = port,
        "Draft Zero API listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn core_errors_map_to_http_statuses() {
        assert_eq!(
            status_of(draft_core::Error::DocumentNotFound(Uuid::nil()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(draft_core::Error::InvalidInput("bad".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(draft_core::Error::Forbidden("no".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(draft_core::Error::Conflict("stale".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(draft_core::Error::RateLimited("slow down".into()).into()),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            status_of(draft_core::Error::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unauthorized_is_401() {
        assert_eq!(
            status_of(ApiError::Unauthorized("missing header".into())),
            StatusCode::UNAUTHORIZED
        );
    }
}
