//! Sharing record repository behavior against a live database.
//!
//! Run with `cargo test -- --ignored` and a migrated database reachable via
//! `DATABASE_URL`.

use uuid::Uuid;

use draft_core::{
    any_has_permission, ActionPermission, CreateDocumentRequest, CreateUserRequest,
    DocumentRepository, PermissionRepository, PermissionScope, Role, TypedRole, UserRepository,
};
use draft_db::Database;

async fn connect() -> Database {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/draftzero_test".to_string());
    Database::connect(&url).await.expect("test database")
}

async fn seeded_user(db: &Database, name: &str) -> Uuid {
    db.users
        .insert(CreateUserRequest {
            display_name: name.to_string(),
            email: format!("{}-{}@example.com", name, Uuid::new_v4()),
        })
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires a live database"]
async fn owner_gets_implicit_document_owner_role() {
    let db = connect().await;
    let owner = seeded_user(&db, "owner").await;
    let (document_id, _) = db
        .documents
        .insert(
            owner,
            CreateDocumentRequest {
                title: "Shared draft".to_string(),
                content: String::new(),
            },
        )
        .await
        .unwrap();

    let roles = db.permissions.roles_for_document(owner, document_id).await.unwrap();
    assert_eq!(
        roles,
        vec![TypedRole::new(Role::Owner, PermissionScope::Document)]
    );
    assert!(any_has_permission(&roles, ActionPermission::DeleteDocument));
}

#[tokio::test]
#[ignore = "requires a live database"]
async fn version_scope_grant_is_distinct_from_document_scope() {
    let db = connect().await;
    let owner = seeded_user(&db, "owner").await;
    let collaborator = seeded_user(&db, "collaborator").await;
    let (document_id, version_id) = db
        .documents
        .insert(
            owner,
            CreateDocumentRequest {
                title: "Shared draft".to_string(),
                content: String::new(),
            },
        )
        .await
        .unwrap();

    db.permissions
        .grant_document_role(collaborator, document_id, Some(version_id), Role::Admin)
        .await
        .unwrap();

    let roles = db
        .permissions
        .roles_for_document(collaborator, document_id)
        .await
        .unwrap();
    assert_eq!(
        roles,
        vec![TypedRole::new(Role::Admin, PermissionScope::DocumentVersion)]
    );
    // A version-scope admin cannot share the whole document
    assert!(!any_has_permission(&roles, ActionPermission::ShareDocument));
    assert!(any_has_permission(
        &roles,
        ActionPermission::PublishDocumentVersion
    ));
}

#[tokio::test]
#[ignore = "requires a live database"]
async fn regranting_replaces_the_role() {
    let db = connect().await;
    let owner = seeded_user(&db, "owner").await;
    let collaborator = seeded_user(&db, "collaborator").await;
    let (document_id, _) = db
        .documents
        .insert(
            owner,
            CreateDocumentRequest {
                title: "Shared draft".to_string(),
                content: String::new(),
            },
        )
        .await
        .unwrap();

    db.permissions
        .grant_document_role(collaborator, document_id, None, Role::Reviewer)
        .await
        .unwrap();
    db.permissions
        .grant_document_role(collaborator, document_id, None, Role::Editor)
        .await
        .unwrap();

    let roles = db
        .permissions
        .roles_for_document(collaborator, document_id)
        .await
        .unwrap();
    assert_eq!(
        roles,
        vec![TypedRole::new(Role::Editor, PermissionScope::Document)]
    );

    db.permissions
        .revoke_document_roles(collaborator, document_id)
        .await
        .unwrap();
    let roles = db
        .permissions
        .roles_for_document(collaborator, document_id)
        .await
        .unwrap();
    assert!(roles.is_empty());
}
