//! End-to-end engine tests over mock backends and an in-memory state
//! repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use draft_core::{
    defaults, EmbeddingInput, Error, IdeaLinkageState, IdeaStateRepository, Result,
};
use draft_inference::{CostGuard, MockEmbeddingBackend, MockGenerationBackend};
use draft_linkage::{pair_hash, LinkageEngine};

/// In-memory state repository with the same compare-and-swap contract as the
/// PostgreSQL implementation.
#[derive(Default)]
struct MemoryStateRepository {
    inner: Mutex<HashMap<Uuid, (IdeaLinkageState, i64)>>,
}

#[async_trait]
impl IdeaStateRepository for MemoryStateRepository {
    async fn load(&self, document_id: Uuid) -> Result<Option<(IdeaLinkageState, i64)>> {
        Ok(self.inner.lock().unwrap().get(&document_id).cloned())
    }

    async fn store(
        &self,
        document_id: Uuid,
        state: &IdeaLinkageState,
        expected: Option<i64>,
    ) -> Result<i64> {
        let mut map = self.inner.lock().unwrap();
        let current = map.get(&document_id).map(|(_, rev)| *rev);
        match (current, expected) {
            (None, None) => {
                map.insert(document_id, (state.clone(), 1));
                Ok(1)
            }
            (Some(rev), Some(exp)) if rev == exp => {
                map.insert(document_id, (state.clone(), rev + 1));
                Ok(rev + 1)
            }
            _ => Err(Error::Conflict(format!(
                "linkage state revision mismatch for document {}",
                document_id
            ))),
        }
    }
}

/// Wrapper that lets a rival writer sneak in a store between the engine's
/// load and store, forcing exactly one CAS conflict.
struct RacingRepository {
    inner: MemoryStateRepository,
    rival_state: IdeaLinkageState,
    raced: AtomicBool,
}

#[async_trait]
impl IdeaStateRepository for RacingRepository {
    async fn load(&self, document_id: Uuid) -> Result<Option<(IdeaLinkageState, i64)>> {
        self.inner.load(document_id).await
    }

    async fn store(
        &self,
        document_id: Uuid,
        state: &IdeaLinkageState,
        expected: Option<i64>,
    ) -> Result<i64> {
        if !self.raced.swap(true, Ordering::SeqCst) {
            let rival_expected = self
                .inner
                .load(document_id)
                .await?
                .map(|(_, rev)| rev);
            self.inner
                .store(document_id, &self.rival_state, rival_expected)
                .await?;
        }
        self.inner.store(document_id, state, expected).await
    }
}

const FRUIT_A: &str = "apples are fruit";
const FRUIT_B: &str = "bananas are fruit";
const ROCKET_C: &str = "rockets are fast";

fn input(id: &str, text: &str) -> EmbeddingInput {
    EmbeddingInput {
        node_id: id.to_string(),
        text: text.to_string(),
    }
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Backend where A and B are nearly parallel and C is orthogonal to both.
fn fruit_backend() -> MockEmbeddingBackend {
    MockEmbeddingBackend::new(3)
        .with_fixture(FRUIT_A, vec![1.0, 0.0, 0.0])
        .with_fixture(FRUIT_B, vec![0.9, 0.1, 0.0])
        .with_fixture(ROCKET_C, vec![0.0, 0.0, 1.0])
}

fn engine_with(
    embed: MockEmbeddingBackend,
    generate: MockGenerationBackend,
    states: Arc<dyn IdeaStateRepository>,
) -> LinkageEngine {
    LinkageEngine::new(
        Arc::new(embed),
        Arc::new(generate),
        states,
        Arc::new(CostGuard::new(10_000, 1_000)),
    )
}

#[tokio::test]
async fn only_the_similar_pair_gets_explained() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Both are about fruit.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed.clone(), generate.clone(), states);

    let doc = Uuid::new_v4();
    let user = Uuid::new_v4();
    let inputs = vec![
        input("a", FRUIT_A),
        input("b", FRUIT_B),
        input("c", ROCKET_C),
    ];
    let response = engine
        .link_ideas(user, doc, &inputs, &ids(&["a", "b", "c"]))
        .await
        .unwrap();

    assert_eq!(response.node_list, ids(&["a", "b", "c"]));
    assert_eq!(response.linked_pairs.len(), 1);
    let pair = &response.linked_pairs[0];
    assert_eq!((pair.node_a.as_str(), pair.node_b.as_str()), ("a", "b"));
    assert_eq!(pair.explanation, "Both are about fruit.");

    // Exactly one explainer entry, keyed by one ordering of the pair texts
    assert_eq!(response.explainers.len(), 1);
    let fwd = pair_hash(FRUIT_A, FRUIT_B);
    let rev = pair_hash(FRUIT_B, FRUIT_A);
    assert!(response.explainers.contains_key(&fwd) || response.explainers.contains_key(&rev));

    assert_eq!(embed.call_count(), 3);
    assert_eq!(generate.call_count(), 1);
}

#[tokio::test]
async fn matrix_is_upper_triangular_with_offset_columns() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Linked.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed, generate, states);

    let response = engine
        .link_ideas(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[
                input("a", FRUIT_A),
                input("b", FRUIT_B),
                input("c", ROCKET_C),
            ],
            &ids(&["a", "b", "c"]),
        )
        .await
        .unwrap();

    let matrix = &response.similarity_matrix;
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix[0].len(), 2); // (a,b) at offset 0, (a,c) at offset 1
    assert_eq!(matrix[1].len(), 1); // (b,c)
    assert_eq!(matrix[2].len(), 0);
    assert!(matrix[0][0] > 0.9, "a·b should be near-parallel");
    assert!(matrix[0][1].abs() < 0.1, "a·c should be near-orthogonal");
}

#[tokio::test]
async fn unchanged_rerun_makes_no_provider_calls() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Both are about fruit.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed.clone(), generate.clone(), states);

    let doc = Uuid::new_v4();
    let user = Uuid::new_v4();
    let inputs = vec![
        input("a", FRUIT_A),
        input("b", FRUIT_B),
        input("c", ROCKET_C),
    ];
    let all = ids(&["a", "b", "c"]);

    engine.link_ideas(user, doc, &inputs, &all).await.unwrap();
    assert_eq!(embed.call_count(), 3);
    assert_eq!(generate.call_count(), 1);

    // Identical texts: the diff finds nothing to re-embed and the explainer
    // cache answers the linked pair.
    let second = engine.link_ideas(user, doc, &inputs, &all).await.unwrap();
    assert_eq!(embed.call_count(), 3);
    assert_eq!(generate.call_count(), 1);
    assert_eq!(second.linked_pairs.len(), 1);
    assert_eq!(second.linked_pairs[0].explanation, "Both are about fruit.");
}

#[tokio::test]
async fn changed_text_reembeds_only_that_node() {
    let embed = fruit_backend().with_fixture("pears are fruit", vec![0.95, 0.05, 0.0]);
    let generate = MockGenerationBackend::new("Both are about fruit.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed.clone(), generate, states);

    let doc = Uuid::new_v4();
    let user = Uuid::new_v4();
    let all = ids(&["a", "b", "c"]);

    engine
        .link_ideas(
            user,
            doc,
            &[
                input("a", FRUIT_A),
                input("b", FRUIT_B),
                input("c", ROCKET_C),
            ],
            &all,
        )
        .await
        .unwrap();
    assert_eq!(embed.texts_embedded(), 3);

    engine
        .link_ideas(
            user,
            doc,
            &[
                input("a", "pears are fruit"),
                input("b", FRUIT_B),
                input("c", ROCKET_C),
            ],
            &all,
        )
        .await
        .unwrap();
    // Only the edited node went back to the provider
    assert_eq!(embed.texts_embedded(), 4);
}

#[tokio::test]
async fn reversed_enumeration_reuses_cached_explanation() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("should not be called");
    let states = Arc::new(MemoryStateRepository::default());

    // Seed stored state with nodes in (b, a) order and an explanation cached
    // under the OPPOSITE text order, as an earlier pass would have written it.
    let mut explainers = HashMap::new();
    explainers.insert(pair_hash(FRUIT_A, FRUIT_B), "Both are about fruit.".to_string());
    let seeded = IdeaLinkageState {
        version: defaults::LINKAGE_STATE_VERSION,
        node_list: ids(&["b", "a"]),
        embeddings: vec![vec![0.9, 0.1, 0.0], vec![1.0, 0.0, 0.0]],
        node_text: vec![FRUIT_B.to_string(), FRUIT_A.to_string()],
        similarity_matrix: vec![vec![], vec![]],
        explainers,
    };
    let doc = Uuid::new_v4();
    states.store(doc, &seeded, None).await.unwrap();

    let engine = engine_with(embed.clone(), generate.clone(), states);
    let response = engine
        .link_ideas(
            Uuid::new_v4(),
            doc,
            &[input("b", FRUIT_B), input("a", FRUIT_A)],
            &ids(&["b", "a"]),
        )
        .await
        .unwrap();

    // The pair enumerates as (b, a); the (a, b) cache entry still answers it.
    assert_eq!(embed.call_count(), 0);
    assert_eq!(generate.call_count(), 0);
    assert_eq!(response.linked_pairs.len(), 1);
    assert_eq!(response.linked_pairs[0].explanation, "Both are about fruit.");
    assert_eq!(response.explainers.len(), 1);
}

#[tokio::test]
async fn stale_version_blob_reads_as_empty() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Linked.");
    let states = Arc::new(MemoryStateRepository::default());

    let seeded = IdeaLinkageState {
        version: defaults::LINKAGE_STATE_VERSION - 1,
        node_list: ids(&["a"]),
        embeddings: vec![vec![1.0, 0.0, 0.0]],
        node_text: vec![FRUIT_A.to_string()],
        similarity_matrix: vec![vec![]],
        explainers: HashMap::new(),
    };
    let doc = Uuid::new_v4();
    states.store(doc, &seeded, None).await.unwrap();

    let engine = engine_with(embed.clone(), generate, states);
    assert!(engine.stored_state(doc).await.unwrap().is_none());

    engine
        .link_ideas(
            Uuid::new_v4(),
            doc,
            &[input("a", FRUIT_A)],
            &ids(&["a"]),
        )
        .await
        .unwrap();
    // Despite matching text, the stale blob forces a re-embed
    assert_eq!(embed.call_count(), 1);
}

#[tokio::test]
async fn nodes_absent_everywhere_are_dropped() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Linked.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed, generate, states);

    let response = engine
        .link_ideas(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[input("a", FRUIT_A)],
            &ids(&["a", "ghost"]),
        )
        .await
        .unwrap();
    assert_eq!(response.node_list, ids(&["a"]));
}

#[tokio::test]
async fn nodes_outside_all_node_ids_are_pruned() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Both are about fruit.");
    let states: Arc<MemoryStateRepository> = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed, generate, Arc::clone(&states) as Arc<dyn IdeaStateRepository>);

    let doc = Uuid::new_v4();
    let user = Uuid::new_v4();
    engine
        .link_ideas(
            user,
            doc,
            &[
                input("a", FRUIT_A),
                input("b", FRUIT_B),
                input("c", ROCKET_C),
            ],
            &ids(&["a", "b", "c"]),
        )
        .await
        .unwrap();

    // The caller no longer considers c live
    let response = engine
        .link_ideas(user, doc, &[], &ids(&["a", "b"]))
        .await
        .unwrap();
    assert_eq!(response.node_list, ids(&["a", "b"]));

    let (stored, _) = states.load(doc).await.unwrap().unwrap();
    assert_eq!(stored.node_list, ids(&["a", "b"]));
}

#[tokio::test]
async fn cas_conflict_retries_and_merges_both_writers() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Linked.");

    // Rival writer lands a disjoint node ("x") between our load and store.
    let rival_state = IdeaLinkageState {
        version: defaults::LINKAGE_STATE_VERSION,
        node_list: ids(&["x"]),
        embeddings: vec![vec![0.0, 1.0, 0.0]],
        node_text: vec!["meteor showers".to_string()],
        similarity_matrix: vec![vec![]],
        explainers: HashMap::new(),
    };
    let states = Arc::new(RacingRepository {
        inner: MemoryStateRepository::default(),
        rival_state,
        raced: AtomicBool::new(false),
    });

    let engine = engine_with(
        embed.clone(),
        generate,
        Arc::clone(&states) as Arc<dyn IdeaStateRepository>,
    );
    let doc = Uuid::new_v4();
    let response = engine
        .link_ideas(
            Uuid::new_v4(),
            doc,
            &[input("a", FRUIT_A)],
            &ids(&["a", "x"]),
        )
        .await
        .unwrap();

    // The retry merged the rival's node with ours instead of clobbering it
    assert_eq!(response.node_list, ids(&["x", "a"]));
    let (stored, revision) = states.inner.load(doc).await.unwrap().unwrap();
    assert_eq!(stored.node_list, ids(&["x", "a"]));
    assert_eq!(revision, 2);

    // The embedding fetched before the conflict was reused, not re-requested
    assert_eq!(embed.call_count(), 1);
}

#[tokio::test]
async fn stale_revision_store_is_rejected_at_the_repository() {
    let states = MemoryStateRepository::default();
    let doc = Uuid::new_v4();
    let state = IdeaLinkageState::default();

    let rev = states.store(doc, &state, None).await.unwrap();
    assert_eq!(rev, 1);
    let rev = states.store(doc, &state, Some(1)).await.unwrap();
    assert_eq!(rev, 2);

    // A writer still holding revision 1 must not silently clobber revision 2
    let err = states.store(doc, &state, Some(1)).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
}

#[tokio::test]
async fn exhausted_cost_guard_rejects_before_embedding() {
    let embed = fruit_backend();
    let generate = MockGenerationBackend::new("Linked.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = LinkageEngine::new(
        Arc::new(embed.clone()),
        Arc::new(generate),
        states,
        Arc::new(CostGuard::new(1, 1)),
    );

    let err = engine
        .link_ideas(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &[input("a", FRUIT_A), input("b", FRUIT_B)],
            &ids(&["a", "b"]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RateLimited(_)));
}

#[tokio::test]
async fn provider_failure_propagates_unretried() {
    let embed = MockEmbeddingBackend::new(3).failing("provider down");
    let generate = MockGenerationBackend::new("Linked.");
    let states = Arc::new(MemoryStateRepository::default());
    let engine = engine_with(embed, generate, states.clone());

    let doc = Uuid::new_v4();
    let err = engine
        .link_ideas(Uuid::new_v4(), doc, &[input("a", FRUIT_A)], &ids(&["a"]))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));

    // Nothing was persisted for the failed pass
    assert!(states.load(doc).await.unwrap().is_none());
}
