//! Vocabulary engine
//!
//! The entity store plus the operations that move vocabularies in and out of
//! RDF: import, export, publish and staleness tracking.

pub mod clock;
pub mod exporter;
pub mod importer;
pub mod model;
pub mod predicates;
pub mod publish;
pub mod store;

use crate::rdf::CurieError;
use thiserror::Error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use exporter::{export, serialize_vocabulary, Context, ExportError, ExportResult};
pub use importer::{import_file, import_vocabulary, ImportCounters, ImportError, ImportOutcome, ImportResult};
pub use model::{
    ObjectType, Lifecycle, Predicate, PredicateId, Property, PropertyId, Term, TermId, Vocabulary,
    VocabularyDetails, VocabularyId,
};
pub use predicates::{load_predicates, load_predicates_file, PredicateLoadError, PredicateLoadResult, PredicateLoadSummary};
pub use publish::{has_updated, is_published, publication_state, PublicationState, PublishError, PublishResult, Publisher};
pub use store::{StoreSnapshot, VocabStore};

/// Data store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VocabError {
    /// Bad URI syntax, reserved characters, over-long fields
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate term name, deleting a referenced predicate
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type VocabResult<T> = Result<T, VocabError>;

impl From<CurieError> for VocabError {
    fn from(e: CurieError) -> Self {
        VocabError::Validation(e.to_string())
    }
}
