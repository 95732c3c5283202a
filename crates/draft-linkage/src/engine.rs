//! The linkage engine: diff, embed, correlate, explain, persist.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use draft_core::{
    defaults, EmbeddingBackend, EmbeddingInput, Error, GenerationBackend, IdeaLinkageState,
    IdeaStateRepository, LinkageResponse, LinkedPair, Result,
};
use draft_inference::CostGuard;

use crate::explainer::{cached_explanation, explanation_prompt, pair_hash, EXPLAIN_SYSTEM};
use crate::similarity::{build_similarity_matrix, column_for, qualifies};

/// Tunables for a linkage pass.
#[derive(Debug, Clone)]
pub struct LinkageConfig {
    /// Exponent applied to raw similarity before thresholding.
    pub exponent: f32,
    /// Threshold compared against the sharpened similarity.
    pub threshold: f32,
    /// Concurrency width for provider fan-out (embeddings and explanations).
    pub concurrency: usize,
    /// Retries when a concurrent writer wins the compare-and-swap.
    pub max_cas_retries: u32,
}

impl Default for LinkageConfig {
    fn default() -> Self {
        Self {
            exponent: defaults::SIMILARITY_EXPONENT,
            threshold: defaults::SIMILARITY_THRESHOLD,
            concurrency: defaults::LINKAGE_CONCURRENCY,
            max_cas_retries: defaults::CAS_MAX_RETRIES,
        }
    }
}

/// Orchestrates a linkage pass over a document's idea nodes.
///
/// Holds the provider backends, the state repository, and the per-user cost
/// guard behind trait objects so the engine is testable with in-memory
/// fakes.
pub struct LinkageEngine {
    embed: Arc<dyn EmbeddingBackend>,
    generate: Arc<dyn GenerationBackend>,
    states: Arc<dyn IdeaStateRepository>,
    guard: Arc<CostGuard>,
    config: LinkageConfig,
}

impl LinkageEngine {
    /// Create an engine with the default configuration.
    pub fn new(
        embed: Arc<dyn EmbeddingBackend>,
        generate: Arc<dyn GenerationBackend>,
        states: Arc<dyn IdeaStateRepository>,
        guard: Arc<CostGuard>,
    ) -> Self {
        Self::with_config(embed, generate, states, guard, LinkageConfig::default())
    }

    /// Create an engine with a custom configuration.
    pub fn with_config(
        embed: Arc<dyn EmbeddingBackend>,
        generate: Arc<dyn GenerationBackend>,
        states: Arc<dyn IdeaStateRepository>,
        guard: Arc<CostGuard>,
        config: LinkageConfig,
    ) -> Self {
        Self {
            embed,
            generate,
            states,
            guard,
            config,
        }
    }

    /// The stored linkage state for a document, if any.
    ///
    /// Blobs persisted under an older schema version read as `None`.
    pub async fn stored_state(&self, document_id: Uuid) -> Result<Option<IdeaLinkageState>> {
        Ok(self
            .states
            .load(document_id)
            .await?
            .map(|(state, _)| state)
            .filter(|state| state.is_current()))
    }

    /// Run a full linkage pass for a document.
    ///
    /// The pass is a read-compute-write loop under optimistic concurrency:
    /// when a concurrent writer bumps the revision between our load and
    /// store, the whole pass re-runs against the fresh state, reusing every
    /// embedding already fetched during this call. Both sides' disjoint node
    /// updates survive; the original last-write-wins blob race does not.
    #[instrument(
        skip(self, inputs, all_node_ids),
        fields(subsystem = "linkage", component = "engine", op = "link_ideas")
    )]
    pub async fn link_ideas(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        inputs: &[EmbeddingInput],
        all_node_ids: &[String],
    ) -> Result<LinkageResponse> {
        let start = Instant::now();

        // Vectors fetched during this call, kept across CAS retries so a
        // conflict never causes a second provider round-trip for the same
        // (id, text).
        let mut fresh: HashMap<String, (String, Vec<f32>)> = HashMap::new();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let (stored, revision) = match self.states.load(document_id).await? {
                Some((state, rev)) if state.is_current() => (state, Some(rev)),
                Some((state, rev)) => {
                    debug!(
                        document_id = %document_id,
                        stored_version = state.version,
                        "Stored linkage state is stale or inconsistent; recomputing from empty"
                    );
                    (IdeaLinkageState::default(), Some(rev))
                }
                None => (IdeaLinkageState::default(), None),
            };

            let stored_index: HashMap<&str, usize> = stored
                .node_list
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();

            // Diff: a node re-embeds when its id is unknown or its text
            // changed since the stored pass.
            let mut to_embed: Vec<(String, String)> = Vec::new();
            for input in inputs {
                let changed = match stored_index.get(input.node_id.as_str()) {
                    Some(&i) => stored.node_text[i] != input.text,
                    None => true,
                };
                if !changed {
                    continue;
                }
                match fresh.get(&input.node_id) {
                    Some((text, _)) if *text == input.text => {}
                    _ => to_embed.push((input.node_id.clone(), input.text.clone())),
                }
            }

            let embed_count = to_embed.len();
            let fetched: Vec<(String, String, Vec<f32>)> =
                stream::iter(to_embed.into_iter().map(|(id, text)| {
                    let embed = Arc::clone(&self.embed);
                    let guard = Arc::clone(&self.guard);
                    async move {
                        guard.check(user_id)?;
                        let mut vectors = embed.embed_texts(std::slice::from_ref(&text)).await?;
                        let vector = vectors.pop().ok_or_else(|| {
                            Error::Embedding("Provider returned no embedding".to_string())
                        })?;
                        Ok::<_, Error>((id, text, vector))
                    }
                }))
                .buffer_unordered(self.config.concurrency)
                .try_collect()
                .await?;
            for (id, text, vector) in fetched {
                fresh.insert(id, (text, vector));
            }

            // Working set: carried-forward nodes in stored order, then newly
            // embedded nodes in input order, restricted to all_node_ids.
            let all_set: HashSet<&str> = all_node_ids.iter().map(String::as_str).collect();
            let mut order: Vec<String> = Vec::new();
            let mut texts: Vec<String> = Vec::new();
            let mut vectors: Vec<Vec<f32>> = Vec::new();
            let mut seen: HashSet<String> = HashSet::new();

            for (i, id) in stored.node_list.iter().enumerate() {
                if !all_set.contains(id.as_str()) {
                    continue;
                }
                if let Some((text, vector)) = fresh.get(id) {
                    order.push(id.clone());
                    texts.push(text.clone());
                    vectors.push(vector.clone());
                } else {
                    order.push(id.clone());
                    texts.push(stored.node_text[i].clone());
                    vectors.push(stored.embeddings[i].clone());
                }
                seen.insert(id.clone());
            }
            for input in inputs {
                if !all_set.contains(input.node_id.as_str()) || seen.contains(&input.node_id) {
                    continue;
                }
                if let Some((text, vector)) = fresh.get(&input.node_id) {
                    order.push(input.node_id.clone());
                    texts.push(text.clone());
                    vectors.push(vector.clone());
                    seen.insert(input.node_id.clone());
                }
            }

            let dropped = all_node_ids.iter().filter(|id| !seen.contains(*id)).count();
            if dropped > 0 {
                debug!(
                    document_id = %document_id,
                    dropped = dropped,
                    "Nodes absent from both stored state and inputs were dropped"
                );
            }

            let matrix = build_similarity_matrix(&vectors);

            // Threshold the sharpened similarities.
            let mut linked: Vec<(usize, usize, f32)> = Vec::new();
            for (i, row) in matrix.iter().enumerate() {
                for (offset, &sim) in row.iter().enumerate() {
                    if qualifies(sim, self.config.exponent, self.config.threshold) {
                        linked.push((i, column_for(i, offset), sim));
                    }
                }
            }

            // Reuse cached explanations (either text order); generate the rest.
            let mut explainers = stored.explainers.clone();
            let mut cache_hits = 0usize;
            let mut miss_keys: HashSet<String> = HashSet::new();
            let mut misses: Vec<(String, String, String)> = Vec::new();
            for &(i, j, _) in &linked {
                if cached_explanation(&explainers, &texts[i], &texts[j]).is_some() {
                    cache_hits += 1;
                    continue;
                }
                let key = pair_hash(&texts[i], &texts[j]);
                if miss_keys.insert(key.clone()) {
                    misses.push((key, texts[i].clone(), texts[j].clone()));
                }
            }

            let generated: Vec<(String, String)> =
                stream::iter(misses.into_iter().map(|(key, text_a, text_b)| {
                    let generate = Arc::clone(&self.generate);
                    let guard = Arc::clone(&self.guard);
                    async move {
                        guard.check(user_id)?;
                        let explanation = generate
                            .generate_with_system(
                                EXPLAIN_SYSTEM,
                                &explanation_prompt(&text_a, &text_b),
                            )
                            .await?;
                        Ok::<_, Error>((key, explanation))
                    }
                }))
                .buffer_unordered(self.config.concurrency)
                .try_collect()
                .await?;
            for (key, explanation) in generated {
                explainers.insert(key, explanation);
            }

            let state = IdeaLinkageState {
                version: defaults::LINKAGE_STATE_VERSION,
                node_list: order.clone(),
                embeddings: vectors,
                node_text: texts.clone(),
                similarity_matrix: matrix.clone(),
                explainers: explainers.clone(),
            };

            match self.states.store(document_id, &state, revision).await {
                Ok(_) => {
                    let linked_pairs: Vec<LinkedPair> = linked
                        .iter()
                        .map(|&(i, j, similarity)| LinkedPair {
                            node_a: order[i].clone(),
                            node_b: order[j].clone(),
                            similarity,
                            explanation: cached_explanation(&explainers, &texts[i], &texts[j])
                                .cloned()
                                .unwrap_or_default(),
                        })
                        .collect();

                    info!(
                        document_id = %document_id,
                        user_id = %user_id,
                        node_count = order.len(),
                        embed_count = embed_count,
                        pair_count = linked_pairs.len(),
                        cache_hits = cache_hits,
                        attempts = attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Linkage pass complete"
                    );

                    return Ok(LinkageResponse {
                        node_list: order,
                        similarity_matrix: matrix,
                        linked_pairs,
                        explainers,
                    });
                }
                Err(Error::Conflict(_)) if attempt <= self.config.max_cas_retries => {
                    warn!(
                        document_id = %document_id,
                        attempt = attempt,
                        "Concurrent writer won the linkage state store; retrying"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
