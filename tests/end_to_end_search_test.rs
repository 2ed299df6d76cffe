use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use corpusdex::engine::Engine;
use corpusdex::storage::FileStorage;
use corpusdex::{EngineConfig, IngestOutcome, MatchType, RawDocument, Storage};
use tempfile::TempDir;

fn engine_in(dir: &TempDir) -> Engine {
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::open(dir.path()).unwrap());
    let engine = Engine::new(storage, EngineConfig::default());
    engine.initialize(None::<std::io::Empty>).unwrap();
    engine
}

fn doc(id: &str, title: &str) -> RawDocument {
    RawDocument {
        id: Some(id.to_string()),
        title: title.to_string(),
        ..Default::default()
    }
}

#[test]
fn s1_empty_query_returns_empty_page() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let resp = engine.search("", 1, 10).unwrap();
    assert!(resp.results.is_empty());
    assert_eq!(resp.total_results, 0);
    assert!(!resp.has_more);
    assert!(resp.tokens.is_empty());
}

#[test]
fn s2_single_hit_scores_title_weight() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine.run_ingest_sync(vec![doc("d1", "neural networks")]).unwrap();

    let resp = engine.search("neural", 1, 10).unwrap();
    assert_eq!(resp.results.len(), 1);
    let r = &resp.results[0];
    assert_eq!(r.doc_id, "d1");
    assert_eq!(r.score, 5.0);
    assert_eq!(r.match_type, MatchType::Exact);
    assert_eq!(r.word_count, 1);
}

#[test]
fn s4_conjunction_excludes_documents_missing_a_term() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine
        .run_ingest_sync(vec![doc("d4", "deep"), doc("d5", "learning")])
        .unwrap();

    let resp = engine.search("deep learning", 1, 10).unwrap();
    assert_eq!(resp.total_results, 0);
}

#[test]
fn s5_semantic_expansion_matches_via_synonym() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine.run_ingest_sync(vec![doc("d6", "automobile safety")]).unwrap();

    // Reinitialize with a tiny GloVe-style vector table so "car" and
    // "automobile" are near-synonyms per §4.7's cosine-similarity test.
    let glove = "car 1.0 0.0\nautomobile 0.99 0.02\nsafety 0.0 1.0\n";
    engine.initialize(Some(Cursor::new(glove))).unwrap();

    let resp = engine.search("car safety", 1, 10).unwrap();
    assert_eq!(resp.results.len(), 1);
    let r = &resp.results[0];
    assert_eq!(r.doc_id, "d6");
    assert_eq!(r.match_type, MatchType::Semantic);
    // 0.5 * base(automobile, TITLE=5) + base(safety, TITLE=5) + proximity(span=1 => 499/100)
    let expected = 0.5 * 5.0 + 5.0 + 4.99;
    assert!((r.score - expected).abs() < 1e-9, "score was {}", r.score);
}

#[test]
fn s6_idempotent_ingest_leaves_doc_store_size_unchanged() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    let batch = vec![doc("d1", "deep learning"), doc("d2", "deep theory")];

    let first = engine.run_ingest_sync(batch.clone()).unwrap();
    let IngestOutcome::Success { indexed_count: first_count, .. } = first else {
        panic!("expected success");
    };
    assert_eq!(first_count, 2);

    let second = engine.run_ingest_sync(batch).unwrap();
    let IngestOutcome::Success { indexed_count: second_count, .. } = second else {
        panic!("expected success");
    };
    assert_eq!(second_count, 0, "re-ingesting the same batch indexes nothing new");

    let status = engine.status();
    assert_eq!(status.lexicon_size, 3); // deep, learning, theory
}

#[test]
fn s7_autocomplete_assembles_multi_word_suggestions() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine
        .run_ingest_sync(vec![doc("d1", "neural neuron network")])
        .unwrap();

    let suggestions = engine.autocomplete("deep neu").unwrap();
    assert_eq!(suggestions, vec!["deep neural", "deep neuron"]);
}

#[test]
fn autocomplete_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine
        .run_ingest_sync(vec![doc("d1", "neural neuron network")])
        .unwrap();

    assert_eq!(
        engine.autocomplete("Deep NEU").unwrap(),
        vec!["deep neural", "deep neuron"]
    );
    assert_eq!(
        engine.autocomplete("NEU").unwrap(),
        vec!["neural", "neuron"]
    );
}

#[test]
fn invariant_search_results_are_always_reachable_in_doc_store() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine
        .run_ingest_sync(vec![
            doc("d1", "deep learning models"),
            doc("d2", "deep theory of learning"),
        ])
        .unwrap();

    let resp = engine.search("deep learning", 1, 10).unwrap();
    assert!(!resp.results.is_empty());
    for result in &resp.results {
        assert!(!result.title.is_empty(), "doc store metadata must be reachable");
    }
}

#[test]
fn invariant_total_results_independent_of_page_and_limit() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);
    engine
        .run_ingest_sync(vec![
            doc("d1", "deep learning"),
            doc("d2", "deep learning theory"),
            doc("d3", "deep learning models"),
        ])
        .unwrap();

    let a = engine.search("deep learning", 1, 1).unwrap();
    let b = engine.search("deep learning", 2, 2).unwrap();
    assert_eq!(a.total_results, b.total_results);
}

#[test]
fn background_ingest_round_trip_then_search_finds_new_batch_only() {
    let dir = TempDir::new().unwrap();
    let engine = engine_in(&dir);

    engine
        .submit_index_json(br#"[{"id":"d1","title":"quantum chromodynamics research"}]"#)
        .unwrap();
    let outcome = engine
        .wait_for_ingest(Duration::from_secs(5))
        .expect("ingest should complete");
    assert!(matches!(outcome, IngestOutcome::Success { indexed_count: 1, .. }));

    let resp = engine.search("quantum", 1, 10).unwrap();
    assert_eq!(resp.results.len(), 1);
    assert_eq!(resp.results[0].doc_id, "d1");
}
