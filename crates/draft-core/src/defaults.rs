//! Centralized default constants for the Draft Zero system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates should reference these constants instead of defining
//! their own magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// EMBEDDING / INFERENCE
// =============================================================================

/// Default OpenAI-compatible API base URL.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding vector dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Default chat model used for linkage explanations.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Timeout for embedding requests in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// IDEA LINKAGE
// =============================================================================

/// Exponent applied to raw cosine similarity before thresholding.
///
/// Sharpens the curve: values near 1 stay near 1, mid-range similarities are
/// suppressed. The exponent is applied BEFORE the linear comparison below;
/// folding it into an adjusted raw threshold changes which pairs qualify and
/// must not be done.
pub const SIMILARITY_EXPONENT: f32 = 3.0;

/// Threshold compared against the sharpened similarity score.
pub const SIMILARITY_THRESHOLD: f32 = 0.5;

/// Concurrency width for provider fan-out (embeddings and explanations).
pub const LINKAGE_CONCURRENCY: usize = 4;

/// Schema version of the stored linkage state blob. Blobs persisted with a
/// different version are treated as empty and fully recomputed.
pub const LINKAGE_STATE_VERSION: i32 = 2;

/// Maximum compare-and-swap retries when persisting linkage state.
pub const CAS_MAX_RETRIES: u32 = 3;

/// Maximum characters of node text included in an explanation prompt.
pub const EXPLAIN_TEXT_PREVIEW: usize = 600;

// =============================================================================
// PROVIDER COST GUARD
// =============================================================================

/// Sustained provider calls allowed per user per minute.
pub const PROVIDER_CALLS_PER_MINUTE: u32 = 30;

/// Burst allowance on top of the sustained rate.
pub const PROVIDER_BURST: u32 = 10;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for list endpoints.
pub const PAGE_LIMIT: i64 = 50;

/// Default page offset.
pub const PAGE_OFFSET: i64 = 0;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default CORS max-age in seconds (1 hour).
pub const CORS_MAX_AGE_SECS: u64 = 3600;

// =============================================================================
// CONTENT LIMITS
// =============================================================================

/// Maximum document title length in characters.
pub const TITLE_MAX_LENGTH: usize = 200;

/// Maximum comment body length in characters.
pub const COMMENT_MAX_LENGTH: usize = 4000;

/// Maximum journal entry length in characters.
pub const JOURNAL_MAX_LENGTH: usize = 20_000;

/// Read a `u64` environment variable with a fallback default.
pub fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Read a `usize` environment variable with a fallback default.
pub fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}
