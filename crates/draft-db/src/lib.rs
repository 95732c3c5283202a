//! # draft-db
//!
//! PostgreSQL database layer for Draft Zero.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - Optimistic-concurrency storage for the idea-linkage state blob
//!
//! ## Example
//!
//! ```rust,ignore
//! use draft_db::Database;
//! use draft_core::{CreateDocumentRequest, DocumentRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/draftzero").await?;
//!     let (doc_id, version_id) = db
//!         .documents
//!         .insert(owner_id, CreateDocumentRequest {
//!             title: "Untitled draft".to_string(),
//!             content: String::new(),
//!         })
//!         .await?;
//!     println!("Created document: {} ({})", doc_id, version_id);
//!     Ok(())
//! }
//! ```

pub mod challenges;
pub mod comments;
pub mod documents;
pub mod idea_state;
pub mod journal;
pub mod notes;
pub mod permissions;
pub mod pool;
pub mod sessions;
pub mod users;
pub mod versions;

// Re-export core types
pub use draft_core::*;

pub use challenges::PgChallengeRepository;
pub use comments::PgCommentRepository;
pub use documents::PgDocumentRepository;
pub use idea_state::PgIdeaStateRepository;
pub use journal::PgJournalRepository;
pub use notes::PgNoteRepository;
pub use permissions::PgPermissionRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sessions::PgSessionRepository;
pub use users::PgUserRepository;
pub use versions::PgVersionRepository;

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// User repository.
    pub users: PgUserRepository,
    /// Document repository.
    pub documents: PgDocumentRepository,
    /// Document version repository.
    pub versions: PgVersionRepository,
    /// Sharing / permission record repository.
    pub permissions: PgPermissionRepository,
    /// Shared note repository.
    pub notes: PgNoteRepository,
    /// Version comment repository.
    pub comments: PgCommentRepository,
    /// Daily challenge repository.
    pub challenges: PgChallengeRepository,
    /// Writing session repository.
    pub sessions: PgSessionRepository,
    /// Scratchpad journal repository.
    pub journal: PgJournalRepository,
    /// Idea-linkage state repository.
    pub idea_state: PgIdeaStateRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            users: PgUserRepository::new(pool.clone()),
            documents: PgDocumentRepository::new(pool.clone()),
            versions: PgVersionRepository::new(pool.clone()),
            permissions: PgPermissionRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            comments: PgCommentRepository::new(pool.clone()),
            challenges: PgChallengeRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            journal: PgJournalRepository::new(pool.clone()),
            idea_state: PgIdeaStateRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}
