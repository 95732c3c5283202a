//! Structured logging schema and field name constants for Draft Zero.
//!
//! All crates use these constants for consistent structured logging fields.
//! This ensures log aggregation tools can query by standardized field names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "db", "inference", "linkage"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "engine", "openai", "pool", "cost_guard"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "link_ideas", "embed_texts", "generate", "store_state"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// User UUID on whose behalf the operation runs.
pub const USER_ID: &str = "user_id";

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Document version UUID being operated on.
pub const VERSION_ID: &str = "version_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of idea nodes in a linkage pass.
pub const NODE_COUNT: &str = "node_count";

/// Number of nodes that required re-embedding.
pub const EMBED_COUNT: &str = "embed_count";

/// Number of node pairs above the linkage threshold.
pub const PAIR_COUNT: &str = "pair_count";

/// Number of explanation cache hits in a linkage pass.
pub const CACHE_HITS: &str = "cache_hits";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
