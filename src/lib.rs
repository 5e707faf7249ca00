//! Grove
//!
//! Vocabulary management for RDF: create vocabularies, import existing RDF
//! graphs into them, and publish them as static documents in JSON-LD,
//! Turtle, RDF/XML and N-Triples.
//!
//! # Architecture
//!
//! - [`rdf`]: RDF terms, namespace prefixes and CURIEs, parsers and serializers
//! - [`vocab`]: the vocabulary store, importer, exporter and publisher
//! - [`persistence`]: RocksDB checkpoints of the store
//! - [`http`]: a thin axum API over the engine
//!
//! ## Example Usage
//!
//! ```rust
//! use grove::rdf::{PrefixRegistry, RdfFormat};
//! use grove::vocab::{import_vocabulary, serialize_vocabulary, VocabStore};
//!
//! let mut store = VocabStore::new();
//! let registry = PrefixRegistry::with_defaults();
//!
//! let source = r#"
//!     @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
//!     <http://example.com/vocab/simple#Thing> rdfs:label "Thing" .
//! "#;
//! let outcome = import_vocabulary(&mut store, source, "http://example.com/vocab/simple#", "turtle").unwrap();
//! assert!(outcome.is_new);
//! assert_eq!(outcome.counters.new_terms, 1);
//! assert_eq!(store.vocabulary(outcome.vocabulary_id).unwrap().label, "Simple");
//!
//! let turtle = serialize_vocabulary(&store, outcome.vocabulary_id, &registry, RdfFormat::Turtle).unwrap();
//! assert!(turtle.contains("@prefix rdfs:"));
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod http;
pub mod persistence;
pub mod rdf;
pub mod vocab;

pub use config::{ConfigError, GroveConfig, ServerConfig};
pub use error::{GroveError, GroveResult};

pub use persistence::{
    PersistenceError, PersistenceManager, PersistenceResult, PersistentStorage, StorageError, StorageResult,
};

pub use rdf::{
    CurieError, Namespace, PrefixRegistry, RdfFormat, RdfParser, RdfSerializer, Triple, UnsupportedFormat,
};

pub use vocab::{
    export, import_file, import_vocabulary, load_predicates, Clock, Context, ImportCounters, ImportError,
    ImportOutcome, PublicationState, PublishError, Publisher, SystemClock, VocabError, VocabResult, VocabStore,
};

use std::sync::Arc;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

/// Open the store described by `config`: recovered from disk when a data
/// path is configured, empty and in-memory otherwise
pub fn open_store(config: &GroveConfig) -> GroveResult<(VocabStore, Option<PersistenceManager>)> {
    match &config.data_path {
        Some(path) => {
            let persistence = PersistenceManager::new(path)?;
            let store = persistence.recover(Arc::new(SystemClock))?;
            Ok((store, Some(persistence)))
        }
        None => Ok((VocabStore::new(), None)),
    }
}
