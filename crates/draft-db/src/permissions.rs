//! Sharing record repository implementation.
//!
//! Rows map straight onto [`TypedRole`]s for the resolver: a grant with a
//! version id carries DocumentVersion scope, one without carries Document
//! scope, and the document owner holds an implicit Document/Owner role that
//! never appears as a row.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::warn;
use uuid::Uuid;

use draft_core::{PermissionRepository, PermissionScope, Result, Role, TypedRole};

/// PostgreSQL implementation of PermissionRepository.
#[derive(Clone)]
pub struct PgPermissionRepository {
    pool: Pool<Postgres>,
}

impl PgPermissionRepository {
    /// Create a new PgPermissionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a stored role string, skipping (and logging) unknown values so
    /// one bad row cannot lock a user out of the resolver entirely.
    fn parse_role(raw: &str) -> Option<Role> {
        match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                warn!(
                    subsystem = "db",
                    component = "permissions",
                    role = raw,
                    "Skipping permission row with unknown role value"
                );
                None
            }
        }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    async fn grant_document_role(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        document_version_id: Option<Uuid>,
        role: Role,
    ) -> Result<Uuid> {
        let id = Uuid::new_v4();
        // One grant per (user, document, version) triple; re-granting
        // replaces the role.
        match document_version_id {
            Some(version_id) => {
                sqlx::query(
                    "INSERT INTO user_document_permissions
                         (id, user_id, document_id, document_version_id, role, created_at)
                     VALUES ($1, $2, $3, $4, $5, $6)
                     ON CONFLICT (user_id, document_id, document_version_id)
                         WHERE document_version_id IS NOT NULL
                     DO UPDATE SET role = EXCLUDED.role",
                )
                .bind(id)
                .bind(user_id)
                .bind(document_id)
                .bind(version_id)
                .bind(role.to_string())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    "INSERT INTO user_document_permissions
                         (id, user_id, document_id, document_version_id, role, created_at)
                     VALUES ($1, $2, $3, NULL, $4, $5)
                     ON CONFLICT (user_id, document_id)
                         WHERE document_version_id IS NULL
                     DO UPDATE SET role = EXCLUDED.role",
                )
                .bind(id)
                .bind(user_id)
                .bind(document_id)
                .bind(role.to_string())
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(id)
    }

    async fn revoke_document_roles(&self, user_id: Uuid, document_id: Uuid) -> Result<()> {
        sqlx::query(
            "DELETE FROM user_document_permissions WHERE user_id = $1 AND document_id = $2",
        )
        .bind(user_id)
        .bind(document_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn roles_for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<TypedRole>> {
        let mut roles = Vec::new();

        let owner_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT owner_id FROM documents WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;
        if owner_id == Some(user_id) {
            roles.push(TypedRole::new(Role::Owner, PermissionScope::Document));
        }

        let rows = sqlx::query(
            "SELECT document_version_id, role FROM user_document_permissions
             WHERE user_id = $1 AND document_id = $2
             ORDER BY created_at ASC",
        )
        .bind(user_id)
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let version_id: Option<Uuid> = row.get("document_version_id");
            let raw: String = row.get("role");
            if let Some(role) = Self::parse_role(&raw) {
                let scope = if version_id.is_some() {
                    PermissionScope::DocumentVersion
                } else {
                    PermissionScope::Document
                };
                roles.push(TypedRole::new(role, scope));
            }
        }

        Ok(roles)
    }

    async fn grant_note_role(&self, user_id: Uuid, note_id: Uuid, role: Role) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO user_note_permissions (id, user_id, note_id, role, created_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, note_id) DO UPDATE SET role = EXCLUDED.role",
        )
        .bind(id)
        .bind(user_id)
        .bind(note_id)
        .bind(role.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn roles_for_note(&self, user_id: Uuid, note_id: Uuid) -> Result<Vec<TypedRole>> {
        let mut roles = Vec::new();

        let owner_id: Option<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM notes WHERE id = $1")
                .bind(note_id)
                .fetch_optional(&self.pool)
                .await?;
        if owner_id == Some(user_id) {
            roles.push(TypedRole::new(Role::Owner, PermissionScope::Note));
        }

        let rows = sqlx::query(
            "SELECT role FROM user_note_permissions WHERE user_id = $1 AND note_id = $2",
        )
        .bind(user_id)
        .bind(note_id)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let raw: String = row.get("role");
            if let Some(role) = Self::parse_role(&raw) {
                roles.push(TypedRole::new(role, PermissionScope::Note));
            }
        }

        Ok(roles)
    }
}
