//! Core data models for Draft Zero.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::defaults;
use crate::permissions::Role;

// =============================================================================
// USERS
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct User {
    pub id: Uuid,
    pub display_name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a user.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub email: String,
}

// =============================================================================
// DOCUMENTS & VERSIONS
// =============================================================================

/// A collaborative document. The owner implicitly holds the Owner role at
/// Document scope; additional access is granted through sharing records.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Document {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker; deleted documents are excluded from listings.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// One editable version of a document.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct DocumentVersion {
    pub id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a document (with its initial version).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateDocumentRequest {
    pub title: String,
    /// Content of the initial version; empty string if omitted.
    #[serde(default)]
    pub content: String,
}

/// Request to create an additional version of a document.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateVersionRequest {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Partial update of a version. `name` renames, `content` edits; either may
/// be omitted. The two fields gate on different actions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateVersionRequest {
    pub name: Option<String>,
    pub content: Option<String>,
}

// =============================================================================
// SHARING / PERMISSION RECORDS
// =============================================================================

/// A persisted sharing grant on a document or one of its versions.
///
/// `document_version_id = None` grants at Document scope; `Some` narrows the
/// grant to a single version. A user may hold several records; the effective
/// capability is the union across all of them.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserDocumentPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub document_version_id: Option<Uuid>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A persisted sharing grant on a note.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UserNotePermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub note_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Request to grant (or replace) a role on a document or version.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ShareDocumentRequest {
    pub user_id: Uuid,
    pub role: Role,
    /// When set, the grant applies to this version only.
    pub document_version_id: Option<Uuid>,
}

// =============================================================================
// NOTES
// =============================================================================

/// A standalone shared note (distinct from the owner-only journal).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a note.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

// =============================================================================
// COMMENTS
// =============================================================================

/// A comment anchored to a document version.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Comment {
    pub id: Uuid,
    pub document_version_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub resolved: bool,
    pub resolved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Request to create a comment.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateCommentRequest {
    pub body: String,
}

// =============================================================================
// DAILY CHALLENGES
// =============================================================================

/// A daily writing challenge prompt. At most one challenge per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct Challenge {
    pub id: Uuid,
    pub date: NaiveDate,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// One user's entry for a challenge. One entry per user per challenge.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct ChallengeEntry {
    pub id: Uuid,
    pub challenge_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Request to seed a challenge prompt.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateChallengeRequest {
    pub date: NaiveDate,
    pub prompt: String,
}

/// Request to submit a challenge entry.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateChallengeEntryRequest {
    pub content: String,
}

// =============================================================================
// WRITING SESSIONS
// =============================================================================

/// A timed slice of a writing session with the words added during it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SessionSegment {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub words_added: i64,
}

/// A tracked writing session against a document.
///
/// Segments accumulate while the session is open; closing it computes and
/// stores the flow statistics.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WritingSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub segments: Vec<SessionSegment>,
    pub flow: Option<crate::flow::FlowStats>,
}

/// Request to start a writing session.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct StartSessionRequest {
    pub document_id: Uuid,
}

// =============================================================================
// JOURNAL
// =============================================================================

/// A scratchpad journal entry. Owner-only; no sharing.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Request to create a journal entry.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateJournalEntryRequest {
    pub body: String,
}

// =============================================================================
// IDEA LINKAGE
// =============================================================================

/// One addressable unit of content submitted for linkage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EmbeddingInput {
    pub node_id: String,
    pub text: String,
}

/// Persisted linkage state for one document, stored as a single JSONB blob.
///
/// `node_list`, `embeddings`, and `node_text` are parallel arrays; the
/// similarity matrix is upper-triangular with row `i` holding offsets, so
/// the actual column for `similarity_matrix[i][j]` is `i + 1 + j`. The
/// explainer map is keyed by a content hash of the linked pair's texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct IdeaLinkageState {
    pub version: i32,
    pub node_list: Vec<String>,
    pub embeddings: Vec<Vec<f32>>,
    pub node_text: Vec<String>,
    pub similarity_matrix: Vec<Vec<f32>>,
    pub explainers: HashMap<String, String>,
}

impl Default for IdeaLinkageState {
    fn default() -> Self {
        Self {
            version: defaults::LINKAGE_STATE_VERSION,
            node_list: Vec::new(),
            embeddings: Vec::new(),
            node_text: Vec::new(),
            similarity_matrix: Vec::new(),
            explainers: HashMap::new(),
        }
    }
}

impl IdeaLinkageState {
    /// Whether the parallel arrays agree in length and the schema version is
    /// current. Inconsistent or stale blobs are treated as empty by readers.
    pub fn is_current(&self) -> bool {
        self.version == defaults::LINKAGE_STATE_VERSION
            && self.node_list.len() == self.embeddings.len()
            && self.node_list.len() == self.node_text.len()
    }
}

/// Request payload for a linkage pass over a document's idea nodes.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkIdeasRequest {
    /// Nodes with their current text; changed or new nodes are re-embedded.
    pub inputs: Vec<EmbeddingInput>,
    /// The full set of node ids the caller considers live. Nodes absent from
    /// both this pass's inputs and the stored state are dropped.
    pub all_node_ids: Vec<String>,
}

/// A pair of nodes whose sharpened similarity cleared the threshold.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkedPair {
    pub node_a: String,
    pub node_b: String,
    pub similarity: f32,
    pub explanation: String,
}

/// Result of a linkage pass.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LinkageResponse {
    pub node_list: Vec<String>,
    pub similarity_matrix: Vec<Vec<f32>>,
    pub linked_pairs: Vec<LinkedPair>,
    /// The full (pre-existing plus newly generated) explainer cache.
    pub explainers: HashMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linkage_state_default_is_current() {
        let state = IdeaLinkageState::default();
        assert!(state.is_current());
        assert!(state.node_list.is_empty());
    }

    #[test]
    fn linkage_state_stale_version_not_current() {
        let state = IdeaLinkageState {
            version: defaults::LINKAGE_STATE_VERSION - 1,
            ..Default::default()
        };
        assert!(!state.is_current());
    }

    #[test]
    fn linkage_state_mismatched_arrays_not_current() {
        let state = IdeaLinkageState {
            node_list: vec!["a".to_string()],
            ..Default::default()
        };
        assert!(!state.is_current());
    }

    #[test]
    fn linkage_state_round_trips_through_json() {
        let mut explainers = HashMap::new();
        explainers.insert("abc123".to_string(), "Both discuss fruit.".to_string());
        let state = IdeaLinkageState {
            version: defaults::LINKAGE_STATE_VERSION,
            node_list: vec!["a".to_string(), "b".to_string()],
            embeddings: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            node_text: vec!["apples".to_string(), "bananas".to_string()],
            similarity_matrix: vec![vec![0.0], vec![]],
            explainers,
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: IdeaLinkageState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn update_version_request_defaults_to_no_changes() {
        let req: UpdateVersionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.name.is_none());
        assert!(req.content.is_none());
    }

    #[test]
    fn create_document_request_defaults_content() {
        let req: CreateDocumentRequest =
            serde_json::from_str(r#"{"title": "Untitled draft"}"#).unwrap();
        assert_eq!(req.title, "Untitled draft");
        assert!(req.content.is_empty());
    }
}
