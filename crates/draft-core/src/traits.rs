//! Repository and backend trait definitions.
//!
//! Repositories abstract the PostgreSQL layer (implemented in `draft-db`);
//! backends abstract the external embedding/chat providers (implemented in
//! `draft-inference`). The linkage engine and the API server depend only on
//! these traits, which keeps both testable with in-memory fakes.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::flow::FlowStats;
use crate::models::{
    Challenge, ChallengeEntry, Comment, CreateChallengeRequest, CreateDocumentRequest,
    CreateNoteRequest, CreateUserRequest, CreateVersionRequest, Document, DocumentVersion,
    IdeaLinkageState, JournalEntry, Note, SessionSegment, User, WritingSession,
};
use crate::permissions::{Role, TypedRole};
use crate::Result;

// =============================================================================
// USER REPOSITORY
// =============================================================================

/// Repository trait for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user, returning its id.
    async fn insert(&self, req: CreateUserRequest) -> Result<Uuid>;

    /// Fetch a user by id.
    async fn fetch(&self, id: Uuid) -> Result<User>;

    /// Fetch a user by email, if present.
    async fn fetch_by_email(&self, email: &str) -> Result<Option<User>>;
}

// =============================================================================
// DOCUMENT REPOSITORY
// =============================================================================

/// Repository trait for documents.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Create a document with its initial version; returns (document id,
    /// initial version id).
    async fn insert(&self, owner_id: Uuid, req: CreateDocumentRequest) -> Result<(Uuid, Uuid)>;

    /// Fetch a document by id. Soft-deleted documents are not found.
    async fn fetch(&self, id: Uuid) -> Result<Document>;

    /// Rename a document.
    async fn rename(&self, id: Uuid, title: &str) -> Result<()>;

    /// Soft-delete a document.
    async fn soft_delete(&self, id: Uuid) -> Result<()>;

    /// List documents the user owns or has a grant on, newest first.
    async fn list_for_user(&self, user_id: Uuid, limit: i64, offset: i64) -> Result<Vec<Document>>;
}

// =============================================================================
// DOCUMENT VERSION REPOSITORY
// =============================================================================

/// Repository trait for document versions.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    /// Create a version under a document, returning its id.
    async fn insert(&self, document_id: Uuid, req: CreateVersionRequest) -> Result<Uuid>;

    /// Fetch a version by id.
    async fn fetch(&self, id: Uuid) -> Result<DocumentVersion>;

    /// List all versions of a document, oldest first.
    async fn list_for_document(&self, document_id: Uuid) -> Result<Vec<DocumentVersion>>;

    /// Rename a version.
    async fn rename(&self, id: Uuid, name: &str) -> Result<()>;

    /// Replace a version's content.
    async fn update_content(&self, id: Uuid, content: &str) -> Result<()>;

    /// Mark a version as published.
    async fn publish(&self, id: Uuid) -> Result<()>;

    /// Delete a version. The last remaining version of a document cannot be
    /// deleted.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// PERMISSION REPOSITORY
// =============================================================================

/// Repository trait for sharing records.
///
/// Reads return [`TypedRole`]s ready for the permission resolver; the
/// document owner's implicit Document/Owner role is included.
#[async_trait]
pub trait PermissionRepository: Send + Sync {
    /// Grant (or replace) a role for a user on a document or one version.
    async fn grant_document_role(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        document_version_id: Option<Uuid>,
        role: Role,
    ) -> Result<Uuid>;

    /// Remove every grant a user holds on a document (all scopes).
    async fn revoke_document_roles(&self, user_id: Uuid, document_id: Uuid) -> Result<()>;

    /// All roles a user holds on a document: the implicit owner role,
    /// document-scope grants, and version-scope grants.
    async fn roles_for_document(&self, user_id: Uuid, document_id: Uuid) -> Result<Vec<TypedRole>>;

    /// Grant (or replace) a role for a user on a note.
    async fn grant_note_role(&self, user_id: Uuid, note_id: Uuid, role: Role) -> Result<Uuid>;

    /// All roles a user holds on a note (implicit owner role included).
    async fn roles_for_note(&self, user_id: Uuid, note_id: Uuid) -> Result<Vec<TypedRole>>;
}

// =============================================================================
// NOTE REPOSITORY
// =============================================================================

/// Repository trait for shared notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a note, returning its id.
    async fn insert(&self, owner_id: Uuid, req: CreateNoteRequest) -> Result<Uuid>;

    /// Fetch a note by id.
    async fn fetch(&self, id: Uuid) -> Result<Note>;

    /// Replace a note's content.
    async fn update_content(&self, id: Uuid, content: &str) -> Result<()>;

    /// Rename a note.
    async fn rename(&self, id: Uuid, title: &str) -> Result<()>;

    /// Delete a note.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// COMMENT REPOSITORY
// =============================================================================

/// Repository trait for version comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment on a version, returning its id.
    async fn insert(&self, version_id: Uuid, author_id: Uuid, body: &str) -> Result<Uuid>;

    /// Fetch a comment by id.
    async fn fetch(&self, id: Uuid) -> Result<Comment>;

    /// List a version's comments, oldest first.
    async fn list_for_version(&self, version_id: Uuid) -> Result<Vec<Comment>>;

    /// Mark a comment resolved, recording who resolved it.
    async fn resolve(&self, id: Uuid, resolved_by: Uuid) -> Result<()>;

    /// Delete a comment.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// CHALLENGE REPOSITORY
// =============================================================================

/// Repository trait for daily writing challenges.
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Seed a challenge prompt for a date, returning its id. One challenge
    /// per calendar day.
    async fn insert(&self, req: CreateChallengeRequest) -> Result<Uuid>;

    /// Fetch the challenge for a given date, if one exists.
    async fn fetch_for_date(&self, date: NaiveDate) -> Result<Option<Challenge>>;

    /// Fetch a challenge by id.
    async fn fetch(&self, id: Uuid) -> Result<Challenge>;

    /// Submit (or replace) a user's entry, returning the entry id.
    async fn upsert_entry(&self, challenge_id: Uuid, user_id: Uuid, content: &str) -> Result<Uuid>;

    /// List a challenge's entries, oldest first.
    async fn list_entries(&self, challenge_id: Uuid) -> Result<Vec<ChallengeEntry>>;
}

// =============================================================================
// WRITING SESSION REPOSITORY
// =============================================================================

/// Repository trait for writing sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Open a session for a user against a document, returning its id.
    async fn start(&self, user_id: Uuid, document_id: Uuid) -> Result<Uuid>;

    /// Append a segment to an open session.
    async fn append_segment(&self, id: Uuid, segment: SessionSegment) -> Result<()>;

    /// Close a session and persist its computed flow statistics.
    async fn finish(&self, id: Uuid, flow: &FlowStats) -> Result<()>;

    /// Fetch a session by id.
    async fn fetch(&self, id: Uuid) -> Result<WritingSession>;

    /// List a user's sessions, newest first.
    async fn list_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<WritingSession>>;
}

// =============================================================================
// JOURNAL REPOSITORY
// =============================================================================

/// Repository trait for scratchpad journal entries.
#[async_trait]
pub trait JournalRepository: Send + Sync {
    /// Append a journal entry, returning its id.
    async fn insert(&self, user_id: Uuid, body: &str) -> Result<Uuid>;

    /// Fetch an entry by id.
    async fn fetch(&self, id: Uuid) -> Result<JournalEntry>;

    /// List a user's entries, newest first.
    async fn list_for_user(&self, user_id: Uuid, limit: i64, offset: i64)
        -> Result<Vec<JournalEntry>>;

    /// Delete an entry.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// IDEA LINKAGE STATE REPOSITORY
// =============================================================================

/// Repository trait for the per-document linkage state blob.
///
/// The blob is read and written whole. Writes use optimistic concurrency: a
/// revision token accompanies each load, and a store with a stale token
/// fails with [`crate::Error::Conflict`] instead of clobbering a concurrent
/// writer's update.
#[async_trait]
pub trait IdeaStateRepository: Send + Sync {
    /// Load the state and its revision token; `None` if the document has no
    /// stored state yet.
    async fn load(&self, document_id: Uuid) -> Result<Option<(IdeaLinkageState, i64)>>;

    /// Store the full state. `expected = None` inserts a first revision;
    /// `Some(n)` replaces revision `n` only, returning the new revision.
    async fn store(
        &self,
        document_id: Uuid,
        state: &IdeaLinkageState,
        expected: Option<i64>,
    ) -> Result<i64>;
}

// =============================================================================
// INFERENCE BACKENDS
// =============================================================================

/// Backend capable of producing text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate one embedding per input text, in input order.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Expected embedding dimension.
    fn dimension(&self) -> usize;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Backend capable of chat-style text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for a bare prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a completion with a system message.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
