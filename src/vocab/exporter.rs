//! Graph exporter
//!
//! Rebuilds the RDF graph of a vocabulary from the store, along with the
//! smallest prefix context that covers the IRIs it uses.

use super::model::{ObjectType, VocabularyId};
use super::store::VocabStore;
use super::VocabError;
use crate::rdf::{
    ns, Literal, NamedNode, PrefixMap, PrefixRegistry, RdfFormat, RdfObject, RdfPredicate, RdfSerializer,
    SerializeError, Triple,
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Vocab(#[from] VocabError),

    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Prefixes referenced by an exported graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Context(PrefixMap);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the first prefix, in registry order, whose namespace `uri`
    /// starts with
    pub fn add_prefix(&mut self, uri: &str, registry: &PrefixRegistry) {
        if let Some((prefix, iri)) = registry.first_match(uri) {
            self.0.insert(prefix.to_string(), iri.to_string());
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &PrefixMap {
        &self.0
    }
}

/// Export the live content of a vocabulary.
///
/// Emits the vocabulary's label, description and preferred prefix when set,
/// a `dc:identifier` triple for every live term, and one triple for every
/// live property, in creation order. A URI-typed value that is not a valid
/// IRI is written as a literal.
pub fn export(
    store: &VocabStore,
    vocabulary_id: VocabularyId,
    registry: &PrefixRegistry,
) -> ExportResult<(Vec<Triple>, Context)> {
    let vocabulary = store.vocabulary(vocabulary_id)?;
    let mut graph = GraphBuilder::new(registry);

    let subject = named_node(&vocabulary.uri)?;
    for (predicate, value) in [
        (ns::RDFS_LABEL, &vocabulary.label),
        (ns::DC_DESCRIPTION, &vocabulary.description),
        (ns::VANN_PREFERRED_PREFIX, &vocabulary.preferred_prefix),
    ] {
        if !value.is_empty() {
            graph.add(&subject, predicate, Literal::new_simple_literal(value.as_str()).into())?;
        }
    }

    for term in store.terms(vocabulary_id, false) {
        let subject = named_node(&term.uri_in(&vocabulary.uri))?;
        graph.add(
            &subject,
            ns::DC_IDENTIFIER,
            Literal::new_simple_literal(term.name.as_str()).into(),
        )?;

        for property in store.properties(term.id, false) {
            let predicate = store.predicate(property.predicate_id)?;
            let object = match predicate.object_type {
                ObjectType::UriRef => match NamedNode::new(&property.value) {
                    Ok(node) => {
                        graph.context.add_prefix(&property.value, registry);
                        RdfObject::NamedNode(node)
                    }
                    Err(e) => {
                        warn!("Exporting {} value {:?} as a literal: {}", predicate.uri, property.value, e);
                        Literal::new_simple_literal(property.value.as_str()).into()
                    }
                },
                ObjectType::Literal => Literal::new_simple_literal(property.value.as_str()).into(),
            };
            graph.add(&subject, &predicate.uri, object)?;
        }
    }

    Ok((graph.triples, graph.context))
}

/// Export a vocabulary and serialize it in one of the four formats
pub fn serialize_vocabulary(
    store: &VocabStore,
    vocabulary_id: VocabularyId,
    registry: &PrefixRegistry,
    format: RdfFormat,
) -> ExportResult<String> {
    let (triples, context) = export(store, vocabulary_id, registry)?;
    Ok(RdfSerializer::serialize(&triples, context.as_map(), format)?)
}

struct GraphBuilder<'a> {
    registry: &'a PrefixRegistry,
    triples: Vec<Triple>,
    context: Context,
}

impl<'a> GraphBuilder<'a> {
    fn new(registry: &'a PrefixRegistry) -> Self {
        Self {
            registry,
            triples: Vec::new(),
            context: Context::new(),
        }
    }

    fn add(&mut self, subject: &NamedNode, predicate: &str, object: RdfObject) -> ExportResult<()> {
        self.context.add_prefix(predicate, self.registry);
        let predicate = RdfPredicate::from(named_node(predicate)?);
        self.triples
            .push(Triple::new(subject.clone().into(), predicate, object));
        Ok(())
    }
}

fn named_node(iri: &str) -> Result<NamedNode, VocabError> {
    NamedNode::new(iri).map_err(|e| VocabError::Validation(e.to_string()))
}
