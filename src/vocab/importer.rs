//! Graph importer
//!
//! Parses an RDF document and merges the subjects under a base URI into the
//! store as terms and properties. The document is parsed in full before the
//! store is touched, and all store changes happen in one transaction, so a
//! failed import leaves nothing behind.

use super::model::{default_label, validate_vocabulary_uri, ObjectType, PredicateId, VocabularyDetails, VocabularyId};
use super::store::VocabStore;
use super::VocabError;
use crate::rdf::{ns, ParseError, RdfFormat, RdfObject, RdfParser, Triple, UnsupportedFormat};
use indexmap::IndexMap;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Import errors
#[derive(Error, Debug)]
pub enum ImportError {
    /// Source could not be read
    #[error("Unable to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Source is not valid in the declared format
    #[error("Unable to parse vocabulary: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),

    /// The parsed content was rejected by the store
    #[error(transparent)]
    Vocab(#[from] VocabError),
}

pub type ImportResult<T> = Result<T, ImportError>;

/// What an import did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounters {
    /// In-scope subjects visited
    pub subjects: usize,
    pub new_terms: usize,
    pub new_properties: usize,
    /// Subjects outside the vocabulary namespace
    pub ignored_subjects: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportOutcome {
    pub vocabulary_id: VocabularyId,
    pub is_new: bool,
    pub counters: ImportCounters,
}

/// Import a file from disk
pub fn import_file(
    store: &mut VocabStore,
    path: impl AsRef<Path>,
    base_uri: &str,
    format: &str,
) -> ImportResult<ImportOutcome> {
    let path = path.as_ref();
    let format = RdfFormat::from_alias(format)?;
    let source = std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", source.len(), path.display());
    import_document(store, &source, base_uri, format)
}

/// Import a document given as a string; `format` is any recognized alias
/// or media type
pub fn import_vocabulary(
    store: &mut VocabStore,
    source: &str,
    base_uri: &str,
    format: &str,
) -> ImportResult<ImportOutcome> {
    let format = RdfFormat::from_alias(format)?;
    import_document(store, source, base_uri, format)
}

fn import_document(
    store: &mut VocabStore,
    source: &str,
    base_uri: &str,
    format: RdfFormat,
) -> ImportResult<ImportOutcome> {
    validate_vocabulary_uri(base_uri)?;
    info!("Importing {} as {}", base_uri, format.label());

    let triples = RdfParser::parse(source, format, Some(base_uri))?;
    let defaults = vocabulary_defaults(&triples, base_uri);

    // Group by subject, keeping document order
    let mut subjects: IndexMap<Option<&str>, Vec<&Triple>> = IndexMap::new();
    for triple in &triples {
        subjects.entry(triple.subject.iri()).or_default().push(triple);
    }

    let outcome = store.transaction(|store| {
        let (vocabulary_id, is_new) = store.find_or_create_vocabulary(base_uri, || defaults)?;
        let mut counters = ImportCounters::default();

        for (subject, triples) in &subjects {
            let name = match subject.and_then(|iri| iri.strip_prefix(base_uri)) {
                // the vocabulary itself; its metadata was read above
                Some("") => continue,
                Some(name) => name,
                None => {
                    counters.ignored_subjects += 1;
                    continue;
                }
            };
            counters.subjects += 1;

            let (term_id, created) = store.find_or_create_term(vocabulary_id, name)?;
            if created {
                counters.new_terms += 1;
            }

            for triple in triples {
                let object_type = match &triple.object {
                    RdfObject::NamedNode(_) => ObjectType::UriRef,
                    RdfObject::Literal(_) => ObjectType::Literal,
                    // anonymous structure (OWL restrictions, lists) has no stable name to store
                    RdfObject::BlankNode(_) => {
                        debug!("Skipping blank node object of {} on {}", triple.predicate, name);
                        continue;
                    }
                };
                let value = triple.object.lexical();
                if triple.predicate.as_str() == ns::DC_IDENTIFIER && value == name {
                    continue;
                }
                let predicate_id = typed_predicate(store, triple.predicate.as_str(), object_type, name, &value)?;
                let (_, created) = store.find_or_create_property(term_id, predicate_id, &value)?;
                if created {
                    counters.new_properties += 1;
                }
            }
        }

        Ok::<_, ImportError>(ImportOutcome {
            vocabulary_id,
            is_new,
            counters,
        })
    })?;

    info!(
        "Imported {}: {} subjects, {} new terms, {} new properties, {} ignored subjects",
        base_uri,
        outcome.counters.subjects,
        outcome.counters.new_terms,
        outcome.counters.new_properties,
        outcome.counters.ignored_subjects
    );
    Ok(outcome)
}

/// The predicate for `uri`, created with `object_type` if new. A value of the
/// other kind than an existing predicate declares is an integrity violation.
fn typed_predicate(
    store: &mut VocabStore,
    uri: &str,
    object_type: ObjectType,
    term: &str,
    value: &str,
) -> ImportResult<PredicateId> {
    match store.predicate_by_uri(uri) {
        Some(predicate) if predicate.object_type != object_type => Err(VocabError::IntegrityViolation(format!(
            "Predicate {} takes {} values, but {} has the {} value {:?}",
            uri, predicate.object_type, term, object_type, value
        ))
        .into()),
        Some(predicate) => Ok(predicate.id),
        None => Ok(store.create_predicate(uri, object_type)?),
    }
}

/// Metadata for a new vocabulary, read from the triples about `base_uri`
fn vocabulary_defaults(triples: &[Triple], base_uri: &str) -> VocabularyDetails {
    let value_of = |predicate: &str| {
        triples
            .iter()
            .find(|t| t.subject.iri() == Some(base_uri) && t.predicate.as_str() == predicate)
            .map(|t| t.object.lexical())
    };

    VocabularyDetails {
        label: value_of(ns::RDFS_LABEL).unwrap_or_else(|| default_label(base_uri)),
        description: value_of(ns::DC_DESCRIPTION).unwrap_or_default(),
        preferred_prefix: value_of(ns::VANN_PREFERRED_PREFIX).unwrap_or_default(),
    }
}
