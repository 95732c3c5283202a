//! # draft-inference
//!
//! External-provider backends for Draft Zero.
//!
//! This crate provides:
//! - An OpenAI-compatible backend implementing the embedding and
//!   chat-completion traits from `draft-core`
//! - A per-user provider cost guard (keyed rate limiter)
//! - Mock backends for deterministic testing (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use draft_inference::OpenAIBackend;
//! use draft_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let texts = vec!["Hello".to_string()];
//!     let embeddings = backend.embed_texts(&texts).await.unwrap();
//! }
//! ```

pub mod limits;
pub mod openai;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use draft_core::*;

pub use limits::CostGuard;
pub use openai::{OpenAIBackend, OpenAIConfig};

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockEmbeddingBackend, MockGenerationBackend};
