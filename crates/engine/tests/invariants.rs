//! Quantified invariants the storage engine must uphold under mutation:
//! index coherence, embedding norm, and text-search monotonicity.

use lattice_engine::{CheckpointPolicy, Engine, EngineConfig};
use tempfile::tempdir;

fn config() -> EngineConfig {
    EngineConfig {
        debug: false,
        checkpoint_policy: CheckpointPolicy::EveryN(u64::MAX),
    }
}

#[test]
fn every_key_embedding_is_unit_norm_or_zero() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), config()).unwrap();
    engine.set("a", "some words here").unwrap();
    engine.set("b", "").unwrap();

    // `a` has tokens, so its similarity to itself should be close to 1.0
    // (cosine of a unit vector against itself).
    let hits = engine.search_similar("some words here", 2).unwrap();
    let a_score = hits.iter().find(|(k, _)| k == "a").unwrap().1;
    assert!((a_score - 1.0).abs() < 1e-9);

    // `b` has no tokens, so its embedding is the zero vector: similarity
    // to anything is 0.0.
    let b_score = hits.iter().find(|(k, _)| k == "b").unwrap().1;
    assert_eq!(b_score, 0.0);
}

#[test]
fn text_search_monotonically_grows_by_exactly_the_new_key() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), config()).unwrap();
    engine.set("d1", "alpha beta").unwrap();
    let before = engine.search_text("alpha");

    engine.set("d2", "alpha gamma").unwrap();
    let after = engine.search_text("alpha");

    let mut expected = before.clone();
    expected.insert("d2".to_string());
    assert_eq!(after, expected);
}

#[test]
fn deleting_a_key_removes_it_from_every_posting_list() {
    let dir = tempdir().unwrap();
    let engine = Engine::open(dir.path(), config()).unwrap();
    engine.set("d1", "alpha beta").unwrap();
    engine.set("d2", "alpha gamma").unwrap();

    engine.delete("d1").unwrap();

    assert!(!engine.search_text("alpha").contains("d1"));
    assert!(engine.search_text("beta").is_empty());
}

#[test]
fn checkpoint_then_reopen_preserves_index_coherence() {
    let dir = tempdir().unwrap();
    {
        let engine = Engine::open(dir.path(), config()).unwrap();
        engine.set("d1", "the quick brown fox").unwrap();
        engine.set("d2", "quick thinking").unwrap();
        engine.checkpoint().unwrap();
    }

    let engine = Engine::open(dir.path(), config()).unwrap();
    assert_eq!(
        engine.search_text("quick"),
        std::collections::BTreeSet::from(["d1".to_string(), "d2".to_string()])
    );
    assert_eq!(engine.get_all_keys().len(), 2);
}
