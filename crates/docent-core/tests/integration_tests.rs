//! End-to-end integration tests for the ingestion and retrieval pipeline.
//!
//! These tests exercise the full workflow with deterministic fakes:
//! 1. Ingestion: chunking → embedding → index build → artifact persist
//! 2. Swap: serialized corpus replacement with atomic publish
//! 3. Retrieval: question embedding → top-k query → context packing →
//!    generation

use docent_core::chunking::SourceDocument;
use docent_core::config::{GenerationOptions, RetrievalConfig, SimilarityMetric};
use docent_core::embedding::Embedder as _;
use docent_core::error::IngestError;
use docent_core::index::VectorIndex;
use docent_core::ingest::IngestionPipeline;
use docent_core::retrieval::{RetrievalService, NOT_READY_ANSWER};
use docent_core::swap::IndexSwapCoordinator;
use docent_core::test_utils::{CannedGenerator, SeededEmbedder};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Test Fixtures
// ============================================================================

const DIMENSION: usize = 64;

struct Stack {
    service: Arc<RetrievalService>,
    coordinator: IndexSwapCoordinator,
    embedder: SeededEmbedder,
    generator: CannedGenerator,
    _dir: TempDir,
}

fn config() -> RetrievalConfig {
    RetrievalConfig {
        embedding_dimension: DIMENSION,
        chunk_size: 200,
        chunk_overlap: 20,
        ..Default::default()
    }
}

/// Builds a full service/coordinator stack over a temp artifact path.
fn stack_with_config(config: RetrievalConfig) -> Stack {
    let dir = TempDir::new().expect("temp dir");
    let embedder = SeededEmbedder::new(DIMENSION);
    let generator = CannedGenerator::new("Generated answer.");

    let service = Arc::new(RetrievalService::new(
        Arc::new(embedder.clone()),
        Arc::new(generator.clone()),
        config.clone(),
        GenerationOptions::default(),
    ));
    let pipeline = IngestionPipeline::new(Arc::new(embedder.clone()), config);
    let coordinator = IndexSwapCoordinator::new(
        pipeline,
        Arc::clone(&service),
        dir.path().join("index.docent"),
    );

    Stack {
        service,
        coordinator,
        embedder,
        generator,
        _dir: dir,
    }
}

fn stack() -> Stack {
    stack_with_config(config())
}

fn artifact_bytes(path: &Path) -> Vec<u8> {
    std::fs::read(path).expect("artifact should exist")
}

// ============================================================================
// Uninitialized state
// ============================================================================

#[tokio::test]
async fn test_answer_before_any_ingestion_returns_fixed_reply() {
    let stack = stack();
    let result = stack.service.answer("anything", None).await.unwrap();
    assert_eq!(result.answer, NOT_READY_ANSWER);
    assert!(result.sources.is_empty());
    // No prompt ever reached the generator.
    assert!(stack.generator.recorded_prompts().is_empty());
}

#[tokio::test]
async fn test_restore_with_no_artifact_is_the_empty_state() {
    let stack = stack();
    let restored = stack.coordinator.restore().await.unwrap();
    assert!(!restored);
    assert!(!stack.service.is_ready());
}

// ============================================================================
// Retrieval scenario
// ============================================================================

#[tokio::test]
async fn test_paris_scenario_retrieves_the_answering_chunk() {
    let mut config = config();
    config.search_k = 1;
    let stack = stack_with_config(config);

    let docs = vec![SourceDocument::from_text(
        "facts.txt",
        "Paris is the capital of France.",
    )];
    stack.coordinator.replace_corpus(&docs).await.unwrap();

    let result = stack
        .service
        .answer("What is the capital of France?", None)
        .await
        .unwrap();

    assert_eq!(result.answer, "Generated answer.");
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].content, "Paris is the capital of France.");
    assert_eq!(result.sources[0].source_id, "facts.txt");
    assert_eq!(result.sources[0].page, 1);

    // The packed context handed to the generator contains the chunk
    // verbatim.
    let prompts = stack.generator.recorded_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Paris is the capital of France."));
    assert!(prompts[0].contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn test_replacing_the_corpus_replaces_not_appends() {
    let stack = stack();
    let first = vec![SourceDocument::from_text(
        "a.txt",
        "Paris is the capital of France.",
    )];
    let second = vec![SourceDocument::from_text(
        "b.txt",
        "Berlin is the capital of Germany.",
    )];

    stack.coordinator.replace_corpus(&first).await.unwrap();
    stack.coordinator.replace_corpus(&second).await.unwrap();

    let result = stack
        .service
        .answer("What is the capital?", Some(5))
        .await
        .unwrap();
    // Only the second corpus is represented.
    assert!(result.sources.iter().all(|s| s.source_id == "b.txt"));
}

// ============================================================================
// Persistence and restore
// ============================================================================

#[tokio::test]
async fn test_persisted_artifact_round_trips_query_behavior() {
    let stack = stack();
    let docs = vec![SourceDocument::from_text(
        "facts.txt",
        "Paris is the capital of France. Berlin is the capital of Germany. \
         Madrid is the capital of Spain.",
    )];
    stack.coordinator.replace_corpus(&docs).await.unwrap();

    let loaded = VectorIndex::load(stack.coordinator.artifact_path()).unwrap();
    let query = stack.embedder.vector_for("capital of France");

    // A second stack restoring from the same artifact answers from an
    // equivalent snapshot.
    let results = loaded.query(&query, 3).unwrap();
    assert!(!results.is_empty());
    assert_eq!(loaded.embedder_id(), stack.embedder.identity());
    assert_eq!(loaded.metric(), SimilarityMetric::InnerProduct);
}

#[tokio::test]
async fn test_restore_publishes_the_persisted_snapshot() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("index.docent");
    let embedder = SeededEmbedder::new(DIMENSION);

    // First process lifetime: ingest and persist.
    {
        let service = Arc::new(RetrievalService::new(
            Arc::new(embedder.clone()),
            Arc::new(CannedGenerator::new("ok")),
            config(),
            GenerationOptions::default(),
        ));
        let coordinator = IndexSwapCoordinator::new(
            IngestionPipeline::new(Arc::new(embedder.clone()), config()),
            Arc::clone(&service),
            &artifact,
        );
        let docs = vec![SourceDocument::from_text(
            "facts.txt",
            "Paris is the capital of France.",
        )];
        coordinator.replace_corpus(&docs).await.unwrap();
    }

    // Second process lifetime: restore from disk.
    let service = Arc::new(RetrievalService::new(
        Arc::new(embedder.clone()),
        Arc::new(CannedGenerator::new("restored")),
        config(),
        GenerationOptions::default(),
    ));
    let coordinator = IndexSwapCoordinator::new(
        IngestionPipeline::new(Arc::new(embedder), config()),
        Arc::clone(&service),
        &artifact,
    );
    assert!(coordinator.restore().await.unwrap());
    assert!(service.is_ready());

    let result = service.answer("capital of France?", Some(1)).await.unwrap();
    assert_eq!(result.sources[0].content, "Paris is the capital of France.");
}

#[tokio::test]
async fn test_restore_rejects_mismatched_embedder() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("index.docent");

    // Persist with a 64-dim embedder.
    let embedder_a = SeededEmbedder::new(DIMENSION);
    let service_a = Arc::new(RetrievalService::new(
        Arc::new(embedder_a.clone()),
        Arc::new(CannedGenerator::new("ok")),
        config(),
        GenerationOptions::default(),
    ));
    let coordinator_a = IndexSwapCoordinator::new(
        IngestionPipeline::new(Arc::new(embedder_a), config()),
        Arc::clone(&service_a),
        &artifact,
    );
    let docs = vec![SourceDocument::from_text("a.txt", "Some text to index.")];
    coordinator_a.replace_corpus(&docs).await.unwrap();

    // Restore with a different embedder configuration.
    let embedder_b = SeededEmbedder::new(32);
    let mut config_b = config();
    config_b.embedding_dimension = 32;
    let service_b = Arc::new(RetrievalService::new(
        Arc::new(embedder_b.clone()),
        Arc::new(CannedGenerator::new("ok")),
        config_b.clone(),
        GenerationOptions::default(),
    ));
    let coordinator_b = IndexSwapCoordinator::new(
        IngestionPipeline::new(Arc::new(embedder_b), config_b),
        Arc::clone(&service_b),
        &artifact,
    );
    let result = coordinator_b.restore().await;
    assert!(matches!(
        result,
        Err(docent_core::error::IndexError::Corrupt(_))
    ));
    assert!(!service_b.is_ready());
}

// ============================================================================
// Atomicity and idempotence
// ============================================================================

#[tokio::test]
async fn test_failed_ingestion_leaves_index_and_artifact_untouched() {
    let dir = TempDir::new().unwrap();
    let artifact = dir.path().join("index.docent");

    // Small chunks so the second corpus needs multiple embedding batches.
    let mut cfg = config();
    cfg.chunk_size = 20;
    cfg.chunk_overlap = 0;

    // Batch call budget: one call for the first (single-batch) corpus,
    // one more for the second corpus's first batch, then failure.
    let embedder = SeededEmbedder::new(DIMENSION).failing_after(2);
    let generator = CannedGenerator::new("ok");
    let service = Arc::new(RetrievalService::new(
        Arc::new(embedder.clone()),
        Arc::new(generator),
        cfg.clone(),
        GenerationOptions::default(),
    ));
    let coordinator = IndexSwapCoordinator::new(
        IngestionPipeline::new(Arc::new(embedder.clone()), cfg),
        Arc::clone(&service),
        &artifact,
    );

    let first = vec![SourceDocument::from_text(
        "a.txt",
        "Paris is the capital of France.",
    )];
    coordinator.replace_corpus(&first).await.unwrap();
    let bytes_before = artifact_bytes(&artifact);
    let chunks_before = service.active_chunks();

    // A multi-document corpus large enough for several 32-chunk
    // embedding batches, so the failure lands partway through.
    let sentence = "Word salad for chunking. ";
    let second = vec![
        SourceDocument::from_text("b.txt", sentence.repeat(100)),
        SourceDocument::from_text("c.txt", sentence.repeat(100)),
    ];
    let result = coordinator.replace_corpus(&second).await;
    assert!(matches!(result, Err(IngestError::Embedding(_))));

    // The active index and the persisted artifact are exactly as before
    // the failed call.
    assert_eq!(service.active_chunks(), chunks_before);
    assert_eq!(artifact_bytes(&artifact), bytes_before);

    embedder.clear_failures();
    let still_served = service.answer("capital of France?", Some(1)).await.unwrap();
    assert_eq!(still_served.sources[0].source_id, "a.txt");
    assert!("Paris is the capital of France.".contains(&still_served.sources[0].content));
}

/// Runs one corpus replacement and returns the ranked (chunk, score)
/// results the persisted artifact yields for a fixed query.
async fn replace_and_query(
    stack: Stack,
    docs: &[SourceDocument],
) -> Vec<(docent_core::chunking::DocumentChunk, u32)> {
    stack.coordinator.replace_corpus(docs).await.unwrap();
    let query = stack.embedder.vector_for("capital of France");
    let loaded = VectorIndex::load(stack.coordinator.artifact_path()).unwrap();
    loaded
        .query(&query, 2)
        .unwrap()
        .iter()
        .map(|r| (r.chunk.clone(), r.score.to_bits()))
        .collect()
}

#[tokio::test]
async fn test_replace_corpus_is_idempotent() {
    let docs = vec![SourceDocument::from_text(
        "facts.txt",
        "Paris is the capital of France. Berlin is the capital of Germany.",
    )];

    let first = replace_and_query(stack(), &docs).await;
    let second = replace_and_query(stack(), &docs).await;
    assert_eq!(first, second);
    assert!(!first.is_empty());
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_answers_concurrent_with_replace_observe_whole_snapshots() {
    let stack = stack();
    let first = vec![SourceDocument::from_text(
        "a.txt",
        "Paris is the capital of France.",
    )];
    stack.coordinator.replace_corpus(&first).await.unwrap();

    let second = vec![SourceDocument::from_text(
        "b.txt",
        "Berlin is the capital of Germany.",
    )];

    let service = Arc::clone(&stack.service);
    let ask = || {
        let service = Arc::clone(&service);
        async move { service.answer("capital?", Some(5)).await.unwrap() }
    };

    let (replaced, r1, r2, r3) = tokio::join!(
        stack.coordinator.replace_corpus(&second),
        ask(),
        ask(),
        ask()
    );
    replaced.unwrap();

    // Every concurrent answer saw a complete snapshot: all of its
    // sources come from one corpus, never a mix.
    for result in [r1, r2, r3] {
        let from_a = result.sources.iter().all(|s| s.source_id == "a.txt");
        let from_b = result.sources.iter().all(|s| s.source_id == "b.txt");
        assert!(from_a || from_b);
    }
}

#[tokio::test]
async fn test_overlapping_replacements_serialize() {
    let stack = stack();
    let corpus_a = vec![SourceDocument::from_text(
        "a.txt",
        "Alpha text for the first corpus.",
    )];
    let corpus_b = vec![SourceDocument::from_text(
        "b.txt",
        "Beta text for the second corpus.",
    )];

    let (ra, rb) = tokio::join!(
        stack.coordinator.replace_corpus(&corpus_a),
        stack.coordinator.replace_corpus(&corpus_b)
    );
    ra.unwrap();
    rb.unwrap();

    // Whichever replacement ran last, the artifact and the active index
    // agree on a single whole corpus.
    let loaded = VectorIndex::load(stack.coordinator.artifact_path()).unwrap();
    assert_eq!(Some(loaded.len()), stack.service.active_chunks());
    let result = stack.service.answer("text", Some(5)).await.unwrap();
    let ids: Vec<&str> = result.sources.iter().map(|s| s.source_id.as_str()).collect();
    assert!(ids.iter().all(|&id| id == "a.txt") || ids.iter().all(|&id| id == "b.txt"));
}

// ============================================================================
// Error propagation
// ============================================================================

#[tokio::test]
async fn test_empty_corpus_is_rejected_without_state_change() {
    let stack = stack();
    let result = stack.coordinator.replace_corpus(&[]).await;
    assert!(matches!(result, Err(IngestError::NoDocuments)));
    assert!(!stack.service.is_ready());
    assert!(!stack.coordinator.artifact_path().exists());
}
