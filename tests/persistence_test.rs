//! Integration tests for checkpointing the vocabulary store to RocksDB

use grove::persistence::PersistenceManager;
use grove::rdf::PrefixRegistry;
use grove::vocab::{import_file, publication_state, PublicationState, Publisher, SystemClock, VocabStore};
use grove::{open_store, GroveConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const BASE: &str = "http://example.com/vocab/simple#";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_checkpoint_and_recover_full_store() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();

    let expected = {
        let manager = PersistenceManager::new(data.path()).unwrap();
        let mut store = manager.recover(Arc::new(SystemClock)).unwrap();
        let outcome = import_file(&mut store, fixture("described.ttl"), BASE, "turtle").unwrap();
        let part_of = store.term_by_name(outcome.vocabulary_id, "partOf").unwrap().id;
        store.delete_term(part_of).unwrap();
        Publisher::new(out.path())
            .publish(&mut store, outcome.vocabulary_id, &PrefixRegistry::with_defaults())
            .unwrap();
        manager.checkpoint(&store).unwrap();
        store.snapshot()
    };

    let manager = PersistenceManager::new(data.path()).unwrap();
    let store = manager.recover(Arc::new(SystemClock)).unwrap();
    assert_eq!(store.snapshot(), expected);

    let vocab = store.vocabulary_by_uri(BASE).unwrap();
    assert_eq!(store.term_count(vocab.id), 1);
    assert_eq!(store.terms(vocab.id, true).len(), 2);
    assert_eq!(publication_state(&store, vocab.id).unwrap(), PublicationState::Published);
}

#[test]
fn test_recovered_store_keeps_allocating_fresh_ids() {
    let data = TempDir::new().unwrap();

    let first_ids = {
        let manager = PersistenceManager::new(data.path()).unwrap();
        let mut store = VocabStore::new();
        import_file(&mut store, fixture("simple.ttl"), BASE, "turtle").unwrap();
        manager.checkpoint(&store).unwrap();
        store.snapshot().terms.iter().map(|t| t.id).collect::<Vec<_>>()
    };

    let manager = PersistenceManager::new(data.path()).unwrap();
    let mut store = manager.recover(Arc::new(SystemClock)).unwrap();
    let outcome = import_file(&mut store, fixture("extra.ttl"), BASE, "turtle").unwrap();
    assert!(!outcome.is_new);

    let other = store.term_by_name(outcome.vocabulary_id, "Other").unwrap();
    assert!(!first_ids.contains(&other.id));
    assert_eq!(store.term_count(outcome.vocabulary_id), 2);
}

#[test]
fn test_checkpoint_replaces_removed_rows() {
    let data = TempDir::new().unwrap();

    {
        let manager = PersistenceManager::new(data.path()).unwrap();
        let mut store = VocabStore::new();
        let outcome = import_file(&mut store, fixture("described.ttl"), BASE, "turtle").unwrap();
        manager.checkpoint(&store).unwrap();

        store.delete_vocabulary(outcome.vocabulary_id).unwrap();
        manager.checkpoint(&store).unwrap();
    }

    let manager = PersistenceManager::new(data.path()).unwrap();
    let store = manager.recover(Arc::new(SystemClock)).unwrap();
    assert_eq!(store.vocabulary_count(), 0);
    assert_eq!(store.property_count(true), 0);
    // predicates outlive the vocabularies that introduced them
    assert_eq!(store.predicates().count(), 5);
}

#[test]
fn test_open_store_from_config() {
    let data = TempDir::new().unwrap();
    let config = GroveConfig {
        data_path: Some(data.path().to_path_buf()),
        ..GroveConfig::default()
    };

    {
        let (mut store, persistence) = open_store(&config).unwrap();
        import_file(&mut store, fixture("simple.ttl"), BASE, "turtle").unwrap();
        persistence.unwrap().checkpoint(&store).unwrap();
    }

    let (store, persistence) = open_store(&config).unwrap();
    assert!(persistence.is_some());
    assert_eq!(store.vocabulary_count(), 1);
}
