//! Mock inference backends for deterministic testing.
//!
//! Embeddings are looked up from registered fixtures, falling back to a
//! deterministic hash-derived vector, so tests control exactly which texts
//! land near each other. All calls are counted for assertions about caching
//! and diff behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use draft_core::{EmbeddingBackend, Error, GenerationBackend, Result};

/// Deterministic embedding backend for tests.
#[derive(Clone)]
pub struct MockEmbeddingBackend {
    dimension: usize,
    fixtures: Arc<Mutex<HashMap<String, Vec<f32>>>>,
    calls: Arc<AtomicUsize>,
    texts_embedded: Arc<AtomicUsize>,
    fail_with: Option<String>,
}

impl MockEmbeddingBackend {
    /// Create a mock backend with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            fixtures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            texts_embedded: Arc::new(AtomicUsize::new(0)),
            fail_with: None,
        }
    }

    /// Register a fixed vector for a text. The vector is padded or truncated
    /// to the backend dimension.
    pub fn with_fixture(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        let mut v = vector;
        v.resize(self.dimension, 0.0);
        self.fixtures.lock().unwrap().insert(text.into(), v);
        self
    }

    /// Make every call fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of `embed_texts` invocations.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of texts embedded across all calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    /// Deterministic fallback vector derived from the text bytes.
    fn hash_vector(&self, text: &str) -> Vec<f32> {
        let mut acc: u64 = 1469598103934665603; // FNV offset basis
        let mut vector = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            for byte in text.as_bytes() {
                acc ^= *byte as u64 ^ i as u64;
                acc = acc.wrapping_mul(1099511628211);
            }
            vector.push(((acc % 2000) as f32 / 1000.0) - 1.0);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingBackend for MockEmbeddingBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if let Some(ref msg) = self.fail_with {
            return Err(Error::Embedding(msg.clone()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);

        let fixtures = self.fixtures.lock().unwrap();
        Ok(texts
            .iter()
            .map(|t| {
                fixtures
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| self.hash_vector(t))
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

/// Scripted generation backend for tests.
#[derive(Clone)]
pub struct MockGenerationBackend {
    default_response: String,
    calls: Arc<AtomicUsize>,
    prompts: Arc<Mutex<Vec<String>>>,
    fail_with: Option<String>,
}

impl MockGenerationBackend {
    /// Create a mock backend returning the given response for every prompt.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    /// Make every call fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Number of generation calls made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All prompts received, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        if let Some(ref msg) = self.fail_with {
            return Err(Error::Inference(msg.clone()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}
