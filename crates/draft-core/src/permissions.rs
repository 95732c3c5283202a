//! Role/permission resolver for documents, document versions, and notes.
//!
//! A two-level, table-driven scheme: a `(scope, role)` pair resolves to a
//! [`PermissionRole`], which resolves to its granted action list. The
//! indirection exists because the same stored role name carries different
//! capabilities at different granularities — a document-level ADMIN and a
//! version-level ADMIN are distinct permission sets even though the stored
//! role value is identical.
//!
//! Resolution is fail-closed: any pair missing from either table grants
//! nothing. The resolver never errors; callers decide whether an empty set
//! is an authorization failure.

use serde::{Deserialize, Serialize};

/// Resource granularity a role applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    Document,
    DocumentVersion,
    Note,
}

impl std::fmt::Display for PermissionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::DocumentVersion => write!(f, "document_version"),
            Self::Note => write!(f, "note"),
        }
    }
}

/// Stored permission level, as persisted on a sharing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Admin,
    Editor,
    LeadReviewer,
    Reviewer,
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "lead_reviewer" => Ok(Self::LeadReviewer),
            "reviewer" => Ok(Self::Reviewer),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Admin => write!(f, "admin"),
            Self::Editor => write!(f, "editor"),
            Self::LeadReviewer => write!(f, "lead_reviewer"),
            Self::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// A role qualified by the scope it was granted at.
///
/// Constructed fresh from a persisted sharing record for each authorization
/// check; never mutated, never persisted itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TypedRole {
    pub role: Role,
    pub scope: PermissionScope,
}

impl TypedRole {
    pub fn new(role: Role, scope: PermissionScope) -> Self {
        Self { role, scope }
    }
}

/// Composite key bridging a (scope, role) pair to its concrete action set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionRole {
    DocumentOwner,
    DocumentAdmin,
    DocumentEditor,
    DocumentLeadReviewer,
    DocumentReviewer,
    DocumentVersionOwner,
    DocumentVersionAdmin,
    DocumentVersionEditor,
    DocumentVersionLeadReviewer,
    DocumentVersionReviewer,
    NoteOwner,
    NoteAdmin,
    NoteEditor,
}

/// An enumerated capability a role can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ActionPermission {
    ShareDocument,
    RenameDocument,
    DeleteDocument,
    CreateDocumentVersion,
    RenameDocumentVersion,
    DeleteDocumentVersion,
    PublishDocumentVersion,
    EditDocumentVersion,
    CommentOnVersion,
    ResolveComment,
    ShareNote,
    RenameNote,
    EditNote,
    DeleteNote,
}

impl std::fmt::Display for ActionPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// First lookup table: (scope, role) → PermissionRole.
///
/// Note scope only recognizes Owner/Admin/Editor; reviewer roles at Note
/// scope resolve to nothing.
fn permission_role_for(typed: TypedRole) -> Option<PermissionRole> {
    use PermissionRole::*;
    use PermissionScope::*;
    match (typed.scope, typed.role) {
        (Document, Role::Owner) => Some(DocumentOwner),
        (Document, Role::Admin) => Some(DocumentAdmin),
        (Document, Role::Editor) => Some(DocumentEditor),
        (Document, Role::LeadReviewer) => Some(DocumentLeadReviewer),
        (Document, Role::Reviewer) => Some(DocumentReviewer),
        (DocumentVersion, Role::Owner) => Some(DocumentVersionOwner),
        (DocumentVersion, Role::Admin) => Some(DocumentVersionAdmin),
        (DocumentVersion, Role::Editor) => Some(DocumentVersionEditor),
        (DocumentVersion, Role::LeadReviewer) => Some(DocumentVersionLeadReviewer),
        (DocumentVersion, Role::Reviewer) => Some(DocumentVersionReviewer),
        (Note, Role::Owner) => Some(NoteOwner),
        (Note, Role::Admin) => Some(NoteAdmin),
        (Note, Role::Editor) => Some(NoteEditor),
        (Note, Role::LeadReviewer) | (Note, Role::Reviewer) => None,
    }
}

/// Second lookup table: PermissionRole → granted actions.
///
/// Adding a new action means appending to these arrays, not adding branch
/// logic. Reviewer and lead-reviewer roles have no entry and therefore grant
/// nothing — inherited behavior, preserved deliberately (see DESIGN.md).
fn granted_actions(role: PermissionRole) -> &'static [ActionPermission] {
    use ActionPermission::*;
    match role {
        PermissionRole::DocumentOwner => &[
            ShareDocument,
            RenameDocument,
            DeleteDocument,
            CreateDocumentVersion,
            RenameDocumentVersion,
            DeleteDocumentVersion,
            PublishDocumentVersion,
            EditDocumentVersion,
            CommentOnVersion,
            ResolveComment,
        ],
        PermissionRole::DocumentAdmin => &[
            ShareDocument,
            RenameDocument,
            CreateDocumentVersion,
            RenameDocumentVersion,
            DeleteDocumentVersion,
            PublishDocumentVersion,
            EditDocumentVersion,
            CommentOnVersion,
            ResolveComment,
        ],
        PermissionRole::DocumentEditor => &[EditDocumentVersion, CommentOnVersion],
        PermissionRole::DocumentVersionOwner | PermissionRole::DocumentVersionAdmin => &[
            RenameDocumentVersion,
            PublishDocumentVersion,
            EditDocumentVersion,
            CommentOnVersion,
            ResolveComment,
        ],
        PermissionRole::DocumentVersionEditor => &[EditDocumentVersion, CommentOnVersion],
        PermissionRole::NoteOwner => &[ShareNote, RenameNote, EditNote, DeleteNote],
        PermissionRole::NoteAdmin => &[ShareNote, RenameNote, EditNote],
        PermissionRole::NoteEditor => &[EditNote],
        PermissionRole::DocumentLeadReviewer
        | PermissionRole::DocumentReviewer
        | PermissionRole::DocumentVersionLeadReviewer
        | PermissionRole::DocumentVersionReviewer => &[],
    }
}

/// All actions granted by a single typed role.
///
/// Returns an empty list (never an error) when either lookup misses. In
/// debug builds an empty resolution is logged so unintentionally
/// zero-permission roles surface during development.
pub fn all_permissions_for(typed: TypedRole) -> Vec<ActionPermission> {
    let actions = permission_role_for(typed)
        .map(granted_actions)
        .unwrap_or(&[]);

    #[cfg(debug_assertions)]
    if actions.is_empty() {
        tracing::warn!(
            role = %typed.role,
            scope = %typed.scope,
            "Role resolves to zero permissions"
        );
    }

    actions.to_vec()
}

/// Whether a single typed role grants the given action.
pub fn has_permission(typed: TypedRole, action: ActionPermission) -> bool {
    permission_role_for(typed)
        .map(granted_actions)
        .unwrap_or(&[])
        .contains(&action)
}

/// Whether ANY of the held roles grants the action.
///
/// A user may hold several simultaneous grants (e.g. a document-level and a
/// version-level record); the effective capability is the logical OR.
pub fn any_has_permission(typed_roles: &[TypedRole], action: ActionPermission) -> bool {
    typed_roles.iter().any(|r| has_permission(*r, action))
}

/// Deduplicated union of all actions granted by the held roles.
///
/// First-seen order is preserved.
pub fn all_permissions_from(typed_roles: &[TypedRole]) -> Vec<ActionPermission> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for typed in typed_roles {
        for action in all_permissions_for(*typed) {
            if seen.insert(action) {
                result.push(action);
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const ALL_ROLES: [Role; 5] = [
        Role::Owner,
        Role::Admin,
        Role::Editor,
        Role::LeadReviewer,
        Role::Reviewer,
    ];

    const ALL_SCOPES: [PermissionScope; 3] = [
        PermissionScope::Document,
        PermissionScope::DocumentVersion,
        PermissionScope::Note,
    ];

    fn as_set(actions: &[ActionPermission]) -> HashSet<ActionPermission> {
        actions.iter().copied().collect()
    }

    #[test]
    fn golden_document_owner() {
        use ActionPermission::*;
        let typed = TypedRole::new(Role::Owner, PermissionScope::Document);
        let expected = as_set(&[
            ShareDocument,
            RenameDocument,
            DeleteDocument,
            CreateDocumentVersion,
            RenameDocumentVersion,
            DeleteDocumentVersion,
            PublishDocumentVersion,
            EditDocumentVersion,
            CommentOnVersion,
            ResolveComment,
        ]);
        assert_eq!(as_set(&all_permissions_for(typed)), expected);
    }

    #[test]
    fn golden_document_admin_cannot_delete_document() {
        let typed = TypedRole::new(Role::Admin, PermissionScope::Document);
        let actions = all_permissions_for(typed);
        assert!(actions.contains(&ActionPermission::ShareDocument));
        assert!(!actions.contains(&ActionPermission::DeleteDocument));
    }

    #[test]
    fn golden_document_editor() {
        use ActionPermission::*;
        let typed = TypedRole::new(Role::Editor, PermissionScope::Document);
        assert_eq!(
            as_set(&all_permissions_for(typed)),
            as_set(&[EditDocumentVersion, CommentOnVersion])
        );
    }

    #[test]
    fn golden_version_admin_distinct_from_document_admin() {
        let doc_admin = TypedRole::new(Role::Admin, PermissionScope::Document);
        let ver_admin = TypedRole::new(Role::Admin, PermissionScope::DocumentVersion);
        // Same stored role value, different capability sets
        assert_ne!(
            as_set(&all_permissions_for(doc_admin)),
            as_set(&all_permissions_for(ver_admin))
        );
        assert!(!has_permission(ver_admin, ActionPermission::ShareDocument));
        assert!(has_permission(
            ver_admin,
            ActionPermission::PublishDocumentVersion
        ));
    }

    #[test]
    fn golden_note_roles() {
        use ActionPermission::*;
        assert_eq!(
            as_set(&all_permissions_for(TypedRole::new(
                Role::Owner,
                PermissionScope::Note
            ))),
            as_set(&[ShareNote, RenameNote, EditNote, DeleteNote])
        );
        assert_eq!(
            as_set(&all_permissions_for(TypedRole::new(
                Role::Admin,
                PermissionScope::Note
            ))),
            as_set(&[ShareNote, RenameNote, EditNote])
        );
        assert_eq!(
            as_set(&all_permissions_for(TypedRole::new(
                Role::Editor,
                PermissionScope::Note
            ))),
            as_set(&[EditNote])
        );
    }

    #[test]
    fn reviewer_roles_grant_nothing_at_every_scope() {
        for scope in ALL_SCOPES {
            for role in [Role::Reviewer, Role::LeadReviewer] {
                let typed = TypedRole::new(role, scope);
                assert!(
                    all_permissions_for(typed).is_empty(),
                    "{:?}/{:?} unexpectedly grants permissions",
                    role,
                    scope
                );
            }
        }
    }

    #[test]
    fn every_pair_is_deterministic() {
        for scope in ALL_SCOPES {
            for role in ALL_ROLES {
                let typed = TypedRole::new(role, scope);
                let first = as_set(&all_permissions_for(typed));
                let second = as_set(&all_permissions_for(typed));
                assert_eq!(first, second);
            }
        }
    }

    #[test]
    fn has_permission_consistent_with_full_list() {
        use ActionPermission::*;
        let all_actions = [
            ShareDocument,
            RenameDocument,
            DeleteDocument,
            CreateDocumentVersion,
            RenameDocumentVersion,
            DeleteDocumentVersion,
            PublishDocumentVersion,
            EditDocumentVersion,
            CommentOnVersion,
            ResolveComment,
            ShareNote,
            RenameNote,
            EditNote,
            DeleteNote,
        ];
        for scope in ALL_SCOPES {
            for role in ALL_ROLES {
                let typed = TypedRole::new(role, scope);
                let listed = as_set(&all_permissions_for(typed));
                for action in all_actions {
                    assert_eq!(
                        has_permission(typed, action),
                        listed.contains(&action),
                        "inconsistency for {:?}/{:?}/{:?}",
                        role,
                        scope,
                        action
                    );
                }
            }
        }
    }

    #[test]
    fn union_matches_per_role_sets() {
        let roles = vec![
            TypedRole::new(Role::Editor, PermissionScope::Document),
            TypedRole::new(Role::Admin, PermissionScope::DocumentVersion),
            TypedRole::new(Role::Reviewer, PermissionScope::Document),
        ];
        let union = all_permissions_from(&roles);

        let mut expected = HashSet::new();
        for r in &roles {
            expected.extend(all_permissions_for(*r));
        }
        assert_eq!(as_set(&union), expected);

        // No duplicates
        let mut seen = HashSet::new();
        for action in &union {
            assert!(seen.insert(*action), "duplicate action {:?}", action);
        }
    }

    #[test]
    fn any_has_permission_is_logical_or() {
        let roles = vec![
            TypedRole::new(Role::Reviewer, PermissionScope::Document),
            TypedRole::new(Role::Editor, PermissionScope::DocumentVersion),
        ];
        assert!(any_has_permission(
            &roles,
            ActionPermission::EditDocumentVersion
        ));
        assert!(!any_has_permission(&roles, ActionPermission::ShareDocument));
        assert!(!any_has_permission(&[], ActionPermission::ShareDocument));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in ALL_ROLES {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }
}
