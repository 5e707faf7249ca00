//! Integration tests for bulk predicate loading and CURIE handling

use grove::rdf::{ns, CurieError, PrefixRegistry};
use grove::vocab::{load_predicates_file, ObjectType, PredicateLoadError, VocabStore};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_load_predicates() {
    let registry = PrefixRegistry::with_defaults();
    let mut store = VocabStore::new();
    let summary = load_predicates_file(fixture("test1.csv"), &registry, &mut store).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.created, 3);

    let label = store.predicate_by_uri(ns::RDFS_LABEL).unwrap();
    assert_eq!(label.object_type, ObjectType::Literal);
    let see_also = store.predicate_by_curie("rdfs:seeAlso", &registry).unwrap().unwrap();
    assert_eq!(see_also.object_type, ObjectType::UriRef);
    let related = store
        .predicate_by_uri("http://example.com/vocab/simple#related")
        .unwrap();
    assert_eq!(related.object_type, ObjectType::UriRef);
    assert_eq!(related.display_name(&registry), "http://example.com/vocab/simple#related");
}

#[test]
fn test_load_predicates_twice() {
    let registry = PrefixRegistry::with_defaults();
    let mut store = VocabStore::new();
    load_predicates_file(fixture("test1.csv"), &registry, &mut store).unwrap();
    let again = load_predicates_file(fixture("test1.csv"), &registry, &mut store).unwrap();
    assert_eq!(again.rows, 3);
    assert_eq!(again.created, 0);
    assert_eq!(store.predicates().count(), 3);
}

#[test]
fn test_load_predicates_extra_column() {
    let mut store = VocabStore::new();
    let result = load_predicates_file(fixture("test2.csv"), &PrefixRegistry::with_defaults(), &mut store);
    assert!(matches!(result, Err(PredicateLoadError::InvalidCsv(_))));
    assert_eq!(store.predicates().count(), 0);
}

#[test]
fn test_load_predicates_unknown_object_type() {
    let mut store = VocabStore::new();
    let result = load_predicates_file(fixture("test3.csv"), &PrefixRegistry::with_defaults(), &mut store);
    match result {
        Err(PredicateLoadError::InvalidCsv(msg)) => assert!(msg.contains("Number"), "{}", msg),
        other => panic!("expected InvalidCsv, got {:?}", other),
    }
    assert_eq!(store.predicates().count(), 0);
}

#[test]
fn test_load_predicates_trims_and_unquotes() {
    let registry = PrefixRegistry::with_defaults();
    let mut store = VocabStore::new();
    let summary = load_predicates_file(fixture("test4.csv"), &registry, &mut store).unwrap();
    assert_eq!(summary.rows, 2);

    let same_as = store
        .predicate_by_uri("http://www.w3.org/2002/07/owl#sameAs")
        .unwrap();
    assert_eq!(same_as.object_type, ObjectType::UriRef);
    assert_eq!(same_as.curie(&registry).as_deref(), Some("owl:sameAs"));
}

#[test]
fn test_load_predicates_missing_file() {
    let mut store = VocabStore::new();
    let result = load_predicates_file(fixture("MISSING.csv"), &PrefixRegistry::with_defaults(), &mut store);
    assert!(matches!(result, Err(PredicateLoadError::InvalidFile(_))));
}

#[test]
fn test_curie_round_trip() {
    let registry = PrefixRegistry::with_defaults();
    for uri in [
        ns::RDF_TYPE,
        ns::RDFS_CLASS,
        ns::DC_IDENTIFIER,
        ns::VANN_PREFERRED_PREFIX,
        "http://www.w3.org/2002/07/owl#sameAs",
        "http://www.w3.org/2004/02/skos/core#prefLabel",
    ] {
        let curie = registry.curie(uri).unwrap();
        assert!(curie.len() < uri.len());
        assert_eq!(registry.expand(&curie).unwrap(), uri);
    }
}

#[test]
fn test_unknown_and_invalid_curies() {
    let registry = PrefixRegistry::with_defaults();
    assert!(matches!(registry.expand("nope:thing"), Err(CurieError::UnknownPrefix(_))));
    assert!(matches!(registry.expand("rdfs:has space"), Err(CurieError::InvalidCurie(_))));
    assert_eq!(
        registry.expand_or_literal("http://example.com/x").unwrap(),
        "http://example.com/x"
    );
    assert_eq!(registry.shorten("http://example.com/x"), "http://example.com/x");
}

#[test]
fn test_clean_value_expands_curies() {
    let registry = PrefixRegistry::with_defaults();
    let mut store = VocabStore::new();
    let see_also = store
        .create_predicate("http://www.w3.org/2000/01/rdf-schema#seeAlso", ObjectType::UriRef)
        .unwrap();
    let comment = store
        .create_predicate("http://www.w3.org/2000/01/rdf-schema#comment", ObjectType::Literal)
        .unwrap();

    assert_eq!(store.clean_value(see_also, "rdfs:Class", &registry).unwrap(), ns::RDFS_CLASS);
    assert_eq!(
        store.clean_value(see_also, "urn:isbn:0451450523", &registry).unwrap(),
        "urn:isbn:0451450523"
    );
    assert!(store.clean_value(see_also, "not a uri", &registry).is_err());
    assert_eq!(store.clean_value(comment, "rdfs:Class", &registry).unwrap(), "rdfs:Class");
}
