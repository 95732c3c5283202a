//! # draft-linkage
//!
//! The idea-linkage engine for Draft Zero.
//!
//! Given a document's idea nodes, the engine:
//! 1. Diffs the supplied texts against the stored state and re-embeds only
//!    new or changed nodes
//! 2. Computes an upper-triangular cosine-similarity matrix over the
//!    working set
//! 3. Sharpens each similarity with an exponent and thresholds it to find
//!    linked pairs
//! 4. Generates (or reuses cached) natural-language explanations for each
//!    linked pair
//! 5. Persists the whole state blob with optimistic concurrency
//!
//! Provider calls are fanned out with bounded concurrency and gated by a
//! per-user cost guard.

pub mod engine;
pub mod explainer;
pub mod similarity;

pub use engine::{LinkageConfig, LinkageEngine};
pub use explainer::{explanation_prompt, pair_hash};
pub use similarity::{build_similarity_matrix, column_for, cosine_similarity, qualifies};
