//! In-memory vocabulary data store
//!
//! Holds the four entity tables and enforces their constraints:
//! - vocabulary URIs are unique
//! - term names are unique per vocabulary among live terms
//! - predicates are unique by URI and protected while referenced
//! - deleting a vocabulary hard-deletes its terms and properties
//! - deleting a term soft-deletes it and cascades to its properties

use super::clock::{Clock, SystemClock};
use super::model::{
    check_len, validate_details, validate_term_name, validate_vocabulary_uri, Lifecycle, ObjectType,
    Predicate, PredicateId, Property, PropertyId, Term, TermId, Vocabulary, VocabularyDetails,
    VocabularyId, MAX_URI_LEN, MAX_VALUE_LEN,
};
use super::{VocabError, VocabResult};
use crate::rdf::{check_uri_chars, ns, PrefixRegistry};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Every row of a store, in id order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub vocabularies: Vec<Vocabulary>,
    pub terms: Vec<Term>,
    pub predicates: Vec<Predicate>,
    pub properties: Vec<Property>,
}

/// Vocabulary data store
///
/// Rows live in insertion-ordered maps so that exports follow the order in
/// which terms and properties were created.
#[derive(Debug, Clone)]
pub struct VocabStore {
    clock: Arc<dyn Clock>,

    vocabularies: IndexMap<VocabularyId, Vocabulary>,
    terms: IndexMap<TermId, Term>,
    predicates: IndexMap<PredicateId, Predicate>,
    properties: IndexMap<PropertyId, Property>,

    /// Vocabulary URI -> id
    vocabulary_uris: HashMap<String, VocabularyId>,
    /// Predicate URI -> id
    predicate_uris: HashMap<String, PredicateId>,

    next_vocabulary_id: u64,
    next_term_id: u64,
    next_predicate_id: u64,
    next_property_id: u64,
}

impl VocabStore {
    /// Create an empty store stamping rows with the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        VocabStore {
            clock,
            vocabularies: IndexMap::new(),
            terms: IndexMap::new(),
            predicates: IndexMap::new(),
            properties: IndexMap::new(),
            vocabulary_uris: HashMap::new(),
            predicate_uris: HashMap::new(),
            next_vocabulary_id: 1,
            next_term_id: 1,
            next_predicate_id: 1,
            next_property_id: 1,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run `f` against a staged copy of the store; keep its changes only
    /// when it succeeds.
    pub fn transaction<T, E>(&mut self, f: impl FnOnce(&mut VocabStore) -> Result<T, E>) -> Result<T, E> {
        let mut staged = self.clone();
        let value = f(&mut staged)?;
        *self = staged;
        Ok(value)
    }

    // ============================================================
    // Vocabularies
    // ============================================================

    /// Create a vocabulary; the URI must be new
    pub fn create_vocabulary(&mut self, uri: &str, details: VocabularyDetails) -> VocabResult<VocabularyId> {
        validate_vocabulary_uri(uri)?;
        validate_details(&details)?;
        if self.vocabulary_uris.contains_key(uri) {
            return Err(VocabError::IntegrityViolation(format!(
                "Vocabulary {} already exists",
                uri
            )));
        }

        let id = VocabularyId::new(self.next_vocabulary_id);
        self.next_vocabulary_id += 1;
        let now = self.now();
        self.vocabularies.insert(
            id,
            Vocabulary {
                id,
                uri: uri.to_string(),
                label: details.label,
                description: details.description,
                preferred_prefix: details.preferred_prefix,
                created: now,
                modified: now,
                published: None,
            },
        );
        self.vocabulary_uris.insert(uri.to_string(), id);
        debug!("Created vocabulary {} ({})", uri, id);
        Ok(id)
    }

    /// Look up a vocabulary by URI, creating it with `defaults` if absent.
    /// An existing vocabulary's metadata is left alone.
    pub fn find_or_create_vocabulary(
        &mut self,
        uri: &str,
        defaults: impl FnOnce() -> VocabularyDetails,
    ) -> VocabResult<(VocabularyId, bool)> {
        match self.vocabulary_uris.get(uri) {
            Some(id) => Ok((*id, false)),
            None => Ok((self.create_vocabulary(uri, defaults())?, true)),
        }
    }

    pub fn vocabulary(&self, id: VocabularyId) -> VocabResult<&Vocabulary> {
        self.vocabularies
            .get(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    pub fn vocabulary_by_uri(&self, uri: &str) -> Option<&Vocabulary> {
        self.vocabulary_uris
            .get(uri)
            .and_then(|id| self.vocabularies.get(id))
    }

    pub fn vocabularies(&self) -> impl Iterator<Item = &Vocabulary> {
        self.vocabularies.values()
    }

    pub fn vocabulary_count(&self) -> usize {
        self.vocabularies.len()
    }

    pub fn update_vocabulary(&mut self, id: VocabularyId, details: VocabularyDetails) -> VocabResult<()> {
        validate_details(&details)?;
        let now = self.now();
        let vocabulary = self.vocabulary_mut(id)?;
        vocabulary.label = details.label;
        vocabulary.description = details.description;
        vocabulary.preferred_prefix = details.preferred_prefix;
        vocabulary.modified = now;
        Ok(())
    }

    /// Hard-delete a vocabulary together with all of its terms and their
    /// properties, soft-deleted ones included
    pub fn delete_vocabulary(&mut self, id: VocabularyId) -> VocabResult<Vocabulary> {
        let vocabulary = self
            .vocabularies
            .shift_remove(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))?;
        self.vocabulary_uris.remove(&vocabulary.uri);

        let term_ids: Vec<TermId> = self
            .terms
            .values()
            .filter(|t| t.vocabulary_id == id)
            .map(|t| t.id)
            .collect();
        self.properties.retain(|_, p| !term_ids.contains(&p.term_id));
        self.terms.retain(|_, t| t.vocabulary_id != id);

        debug!(
            "Deleted vocabulary {} and {} terms",
            vocabulary.uri,
            term_ids.len()
        );
        Ok(vocabulary)
    }

    /// Set `published` and `modified` to the same instant in one write
    pub fn mark_published(&mut self, id: VocabularyId, at: DateTime<Utc>) -> VocabResult<()> {
        let vocabulary = self.vocabulary_mut(id)?;
        vocabulary.published = Some(at);
        vocabulary.modified = at;
        Ok(())
    }

    /// Forget the publish timestamp; `modified` is left unchanged
    pub fn clear_published(&mut self, id: VocabularyId) -> VocabResult<()> {
        self.vocabulary_mut(id)?.published = None;
        Ok(())
    }

    /// Latest modification across the vocabulary, all of its terms and all
    /// of their properties, soft-deleted rows included
    pub fn vocabulary_updated(&self, id: VocabularyId) -> VocabResult<DateTime<Utc>> {
        let vocabulary = self.vocabulary(id)?;
        let mut updated = vocabulary.modified;
        for term in self.terms.values().filter(|t| t.vocabulary_id == id) {
            updated = updated.max(term.modified);
            for property in self.properties.values().filter(|p| p.term_id == term.id) {
                updated = updated.max(property.modified);
            }
        }
        Ok(updated)
    }

    fn vocabulary_mut(&mut self, id: VocabularyId) -> VocabResult<&mut Vocabulary> {
        self.vocabularies
            .get_mut(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    // ============================================================
    // Terms
    // ============================================================

    /// Create a term; its name must be unique among the live terms of the
    /// vocabulary
    pub fn create_term(&mut self, vocabulary_id: VocabularyId, name: &str) -> VocabResult<TermId> {
        validate_term_name(name)?;
        let vocabulary = self.vocabulary(vocabulary_id)?;
        check_len("term uri", &format!("{}{}", vocabulary.uri, name), MAX_URI_LEN)?;
        if self.term_by_name(vocabulary_id, name).is_some() {
            return Err(VocabError::IntegrityViolation(format!(
                "Term {:?} already exists in {}",
                name, vocabulary.uri
            )));
        }

        let id = TermId::new(self.next_term_id);
        self.next_term_id += 1;
        let now = self.now();
        self.terms.insert(
            id,
            Term {
                id,
                vocabulary_id,
                name: name.to_string(),
                created: now,
                modified: now,
                lifecycle: Lifecycle::Live,
            },
        );
        Ok(id)
    }

    pub fn find_or_create_term(&mut self, vocabulary_id: VocabularyId, name: &str) -> VocabResult<(TermId, bool)> {
        match self.term_by_name(vocabulary_id, name) {
            Some(term) => Ok((term.id, false)),
            None => Ok((self.create_term(vocabulary_id, name)?, true)),
        }
    }

    /// Create a term carrying an `rdf:type` property, e.g. `rdfs:Class`
    pub fn add_term_with_type(
        &mut self,
        vocabulary_id: VocabularyId,
        name: &str,
        rdf_type: &str,
    ) -> VocabResult<TermId> {
        self.transaction(|store| {
            let term_id = store.create_term(vocabulary_id, name)?;
            let (predicate_id, _) = store.find_or_create_predicate(ns::RDF_TYPE, ObjectType::UriRef)?;
            store.create_property(term_id, predicate_id, rdf_type)?;
            Ok(term_id)
        })
    }

    /// Any term, live or soft-deleted
    pub fn term(&self, id: TermId) -> VocabResult<&Term> {
        self.terms
            .get(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    /// Live term with the given name
    pub fn term_by_name(&self, vocabulary_id: VocabularyId, name: &str) -> Option<&Term> {
        self.terms
            .values()
            .find(|t| t.vocabulary_id == vocabulary_id && t.name == name && t.is_live())
    }

    /// Terms of a vocabulary in creation order
    pub fn terms(&self, vocabulary_id: VocabularyId, include_deleted: bool) -> Vec<&Term> {
        self.terms
            .values()
            .filter(|t| t.vocabulary_id == vocabulary_id && (include_deleted || t.is_live()))
            .collect()
    }

    /// Number of live terms
    pub fn term_count(&self, vocabulary_id: VocabularyId) -> usize {
        self.terms
            .values()
            .filter(|t| t.vocabulary_id == vocabulary_id && t.is_live())
            .count()
    }

    pub fn term_uri(&self, id: TermId) -> VocabResult<String> {
        let term = self.term(id)?;
        let vocabulary = self.vocabulary(term.vocabulary_id)?;
        Ok(term.uri_in(&vocabulary.uri))
    }

    pub fn rename_term(&mut self, id: TermId, name: &str) -> VocabResult<()> {
        validate_term_name(name)?;
        let term = self.term(id)?;
        if term.name == name {
            return Ok(());
        }
        if self.term_by_name(term.vocabulary_id, name).is_some() {
            return Err(VocabError::IntegrityViolation(format!(
                "Term {:?} already exists",
                name
            )));
        }
        let now = self.now();
        let term = self.term_mut(id)?;
        term.name = name.to_string();
        term.modified = now;
        Ok(())
    }

    /// Soft-delete a term and cascade to its live properties
    pub fn delete_term(&mut self, id: TermId) -> VocabResult<()> {
        let now = self.now();
        let term = self.term_mut(id)?;
        if !term.is_live() {
            return Ok(());
        }
        term.lifecycle = Lifecycle::SoftDeleted {
            at: now,
            by_cascade: false,
        };
        term.modified = now;

        for property in self.properties.values_mut().filter(|p| p.term_id == id && p.is_live()) {
            property.lifecycle = Lifecycle::SoftDeleted {
                at: now,
                by_cascade: true,
            };
            property.modified = now;
        }
        Ok(())
    }

    /// Bring back a soft-deleted term and the properties that were deleted
    /// along with it
    pub fn restore_term(&mut self, id: TermId) -> VocabResult<()> {
        let term = self.term(id)?;
        if term.is_live() {
            return Ok(());
        }
        if self.term_by_name(term.vocabulary_id, &term.name).is_some() {
            return Err(VocabError::IntegrityViolation(format!(
                "Term {:?} already exists",
                term.name
            )));
        }
        let now = self.now();
        let term = self.term_mut(id)?;
        term.lifecycle = Lifecycle::Live;
        term.modified = now;

        for property in self.properties.values_mut().filter(|p| {
            p.term_id == id && matches!(p.lifecycle, Lifecycle::SoftDeleted { by_cascade: true, .. })
        }) {
            property.lifecycle = Lifecycle::Live;
            property.modified = now;
        }
        Ok(())
    }

    /// Remove a term and all of its properties for good
    pub fn hard_delete_term(&mut self, id: TermId) -> VocabResult<Term> {
        let term = self
            .terms
            .shift_remove(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))?;
        self.properties.retain(|_, p| p.term_id != id);
        Ok(term)
    }

    fn term_mut(&mut self, id: TermId) -> VocabResult<&mut Term> {
        self.terms
            .get_mut(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    // ============================================================
    // Predicates
    // ============================================================

    pub fn create_predicate(&mut self, uri: &str, object_type: ObjectType) -> VocabResult<PredicateId> {
        check_uri_chars(uri)?;
        oxiri::Iri::parse(uri).map_err(|e| VocabError::Validation(format!("{}: {}", uri, e)))?;
        check_len("predicate uri", uri, MAX_URI_LEN)?;
        if self.predicate_uris.contains_key(uri) {
            return Err(VocabError::IntegrityViolation(format!(
                "Predicate {} already exists",
                uri
            )));
        }

        let id = PredicateId::new(self.next_predicate_id);
        self.next_predicate_id += 1;
        self.predicates.insert(
            id,
            Predicate {
                id,
                uri: uri.to_string(),
                object_type,
            },
        );
        self.predicate_uris.insert(uri.to_string(), id);
        Ok(id)
    }

    /// Look up a predicate by URI, creating it if absent. The object type of
    /// an existing predicate is never changed.
    pub fn find_or_create_predicate(
        &mut self,
        uri: &str,
        object_type: ObjectType,
    ) -> VocabResult<(PredicateId, bool)> {
        if let Some(predicate) = self.predicate_by_uri(uri) {
            if predicate.object_type != object_type {
                warn!(
                    "Predicate {} takes {} values; keeping it for a {} value",
                    uri, predicate.object_type, object_type
                );
            }
            return Ok((predicate.id, false));
        }
        Ok((self.create_predicate(uri, object_type)?, true))
    }

    pub fn predicate(&self, id: PredicateId) -> VocabResult<&Predicate> {
        self.predicates
            .get(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    pub fn predicate_by_uri(&self, uri: &str) -> Option<&Predicate> {
        self.predicate_uris
            .get(uri)
            .and_then(|id| self.predicates.get(id))
    }

    /// Look up a predicate by CURIE or full URI
    pub fn predicate_by_curie(&self, value: &str, registry: &PrefixRegistry) -> VocabResult<Option<&Predicate>> {
        let uri = registry.expand_or_literal(value)?;
        Ok(self.predicate_by_uri(&uri))
    }

    pub fn predicates(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    /// Number of properties, live or soft-deleted, that use the predicate
    pub fn usage_count(&self, id: PredicateId) -> usize {
        self.properties
            .values()
            .filter(|p| p.predicate_id == id)
            .count()
    }

    /// Delete an unused predicate
    pub fn delete_predicate(&mut self, id: PredicateId) -> VocabResult<Predicate> {
        let usage = self.usage_count(id);
        let predicate = self.predicate(id)?;
        if usage > 0 {
            return Err(VocabError::IntegrityViolation(format!(
                "Predicate {} is used by {} properties",
                predicate.uri, usage
            )));
        }
        let predicate = self
            .predicates
            .shift_remove(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))?;
        self.predicate_uris.remove(&predicate.uri);
        Ok(predicate)
    }

    // ============================================================
    // Properties
    // ============================================================

    pub fn create_property(&mut self, term_id: TermId, predicate_id: PredicateId, value: &str) -> VocabResult<PropertyId> {
        self.term(term_id)?;
        self.predicate(predicate_id)?;
        check_len("value", value, MAX_VALUE_LEN)?;

        let id = PropertyId::new(self.next_property_id);
        self.next_property_id += 1;
        let now = self.now();
        self.properties.insert(
            id,
            Property {
                id,
                term_id,
                predicate_id,
                value: value.to_string(),
                created: now,
                modified: now,
                lifecycle: Lifecycle::Live,
            },
        );
        Ok(id)
    }

    /// Look up a live property by (term, predicate, value), creating it if
    /// absent
    pub fn find_or_create_property(
        &mut self,
        term_id: TermId,
        predicate_id: PredicateId,
        value: &str,
    ) -> VocabResult<(PropertyId, bool)> {
        let existing = self.properties.values().find(|p| {
            p.term_id == term_id && p.predicate_id == predicate_id && p.value == value && p.is_live()
        });
        match existing {
            Some(property) => Ok((property.id, false)),
            None => Ok((self.create_property(term_id, predicate_id, value)?, true)),
        }
    }

    pub fn property(&self, id: PropertyId) -> VocabResult<&Property> {
        self.properties
            .get(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    /// Properties of a term in creation order
    pub fn properties(&self, term_id: TermId, include_deleted: bool) -> Vec<&Property> {
        self.properties
            .values()
            .filter(|p| p.term_id == term_id && (include_deleted || p.is_live()))
            .collect()
    }

    pub fn property_count(&self, include_deleted: bool) -> usize {
        self.properties
            .values()
            .filter(|p| include_deleted || p.is_live())
            .count()
    }

    pub fn update_property_value(&mut self, id: PropertyId, value: &str) -> VocabResult<()> {
        check_len("value", value, MAX_VALUE_LEN)?;
        let now = self.now();
        let property = self.property_mut(id)?;
        property.value = value.to_string();
        property.modified = now;
        Ok(())
    }

    pub fn delete_property(&mut self, id: PropertyId) -> VocabResult<()> {
        let now = self.now();
        let property = self.property_mut(id)?;
        if property.is_live() {
            property.lifecycle = Lifecycle::SoftDeleted {
                at: now,
                by_cascade: false,
            };
            property.modified = now;
        }
        Ok(())
    }

    pub fn hard_delete_property(&mut self, id: PropertyId) -> VocabResult<Property> {
        self.properties
            .shift_remove(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    /// Whether the property's predicate takes URI values
    pub fn value_is_uri(&self, id: PropertyId) -> VocabResult<bool> {
        let property = self.property(id)?;
        Ok(self.predicate(property.predicate_id)?.object_type == ObjectType::UriRef)
    }

    /// The value as a CURIE when a registered prefix shortens it, otherwise
    /// the raw value
    pub fn value_as_curie(&self, id: PropertyId, registry: &PrefixRegistry) -> VocabResult<String> {
        Ok(registry.shorten(&self.property(id)?.value))
    }

    /// CURIE for URI values, raw value for literals
    pub fn value_for_editing(&self, id: PropertyId, registry: &PrefixRegistry) -> VocabResult<String> {
        if self.value_is_uri(id)? {
            self.value_as_curie(id, registry)
        } else {
            Ok(self.property(id)?.value.clone())
        }
    }

    /// Normalize a user-entered value for the given predicate. URI values
    /// may be given as CURIEs; unknown prefixes are kept verbatim.
    pub fn clean_value(&self, predicate_id: PredicateId, value: &str, registry: &PrefixRegistry) -> VocabResult<String> {
        let predicate = self.predicate(predicate_id)?;
        let cleaned = match predicate.object_type {
            ObjectType::Literal => value.to_string(),
            ObjectType::UriRef => registry.expand_or_literal(value).map_err(|_| {
                VocabError::Validation(format!(
                    "{} expects a URI or CURIE",
                    registry.shorten(&predicate.uri)
                ))
            })?,
        };
        check_len("value", &cleaned, MAX_VALUE_LEN)?;
        Ok(cleaned)
    }

    fn property_mut(&mut self, id: PropertyId) -> VocabResult<&mut Property> {
        self.properties
            .get_mut(&id)
            .ok_or_else(|| VocabError::NotFound(id.to_string()))
    }

    // ============================================================
    // Snapshots - used to persist and recover the store
    // ============================================================

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            vocabularies: self.vocabularies.values().cloned().collect(),
            terms: self.terms.values().cloned().collect(),
            predicates: self.predicates.values().cloned().collect(),
            properties: self.properties.values().cloned().collect(),
        }
    }

    /// Rebuild a store from persisted rows, preserving their ids
    pub fn from_snapshot(clock: Arc<dyn Clock>, snapshot: StoreSnapshot) -> VocabResult<Self> {
        let mut store = Self::with_clock(clock);
        for vocabulary in snapshot.vocabularies {
            store.insert_recovered_vocabulary(vocabulary);
        }
        for predicate in snapshot.predicates {
            store.insert_recovered_predicate(predicate);
        }
        for term in snapshot.terms {
            store.insert_recovered_term(term)?;
        }
        for property in snapshot.properties {
            store.insert_recovered_property(property)?;
        }
        Ok(store)
    }

    fn insert_recovered_vocabulary(&mut self, vocabulary: Vocabulary) {
        let id = vocabulary.id;
        self.next_vocabulary_id = self.next_vocabulary_id.max(id.as_u64() + 1);
        self.vocabulary_uris.insert(vocabulary.uri.clone(), id);
        self.vocabularies.insert(id, vocabulary);
    }

    fn insert_recovered_predicate(&mut self, predicate: Predicate) {
        let id = predicate.id;
        self.next_predicate_id = self.next_predicate_id.max(id.as_u64() + 1);
        self.predicate_uris.insert(predicate.uri.clone(), id);
        self.predicates.insert(id, predicate);
    }

    /// The owning vocabulary must already be present
    fn insert_recovered_term(&mut self, term: Term) -> VocabResult<()> {
        self.vocabulary(term.vocabulary_id)?;
        let id = term.id;
        self.next_term_id = self.next_term_id.max(id.as_u64() + 1);
        self.terms.insert(id, term);
        Ok(())
    }

    /// The owning term and the predicate must already be present
    fn insert_recovered_property(&mut self, property: Property) -> VocabResult<()> {
        self.term(property.term_id)?;
        self.predicate(property.predicate_id)?;
        let id = property.id;
        self.next_property_id = self.next_property_id.max(id.as_u64() + 1);
        self.properties.insert(id, property);
        Ok(())
    }
}

impl Default for VocabStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::clock::ManualClock;
    use chrono::Duration;

    const VOCAB: &str = "http://example.com/vocab/test#";

    fn store_with_clock() -> (VocabStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            "2024-04-20T12:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        ));
        (VocabStore::with_clock(clock.clone()), clock)
    }

    fn vocabulary(store: &mut VocabStore) -> VocabularyId {
        store
            .create_vocabulary(VOCAB, VocabularyDetails::derived_from(VOCAB))
            .unwrap()
    }

    #[test]
    fn test_create_vocabulary() {
        let mut store = VocabStore::new();
        let id = vocabulary(&mut store);
        let vocab = store.vocabulary(id).unwrap();
        assert_eq!(vocab.uri, VOCAB);
        assert_eq!(vocab.label, "Test");
        assert_eq!(vocab.published, None);
        assert_eq!(store.vocabulary_by_uri(VOCAB).unwrap().id, id);
    }

    #[test]
    fn test_vocabulary_uri_unique() {
        let mut store = VocabStore::new();
        vocabulary(&mut store);
        let result = store.create_vocabulary(VOCAB, VocabularyDetails::default());
        assert!(matches!(result, Err(VocabError::IntegrityViolation(_))));
    }

    #[test]
    fn test_vocabulary_uri_validated() {
        let mut store = VocabStore::new();
        let result = store.create_vocabulary("http://example.com/no-separator", VocabularyDetails::default());
        assert!(matches!(result, Err(VocabError::Validation(_))));
        assert_eq!(store.vocabulary_count(), 0);
    }

    #[test]
    fn test_find_or_create_vocabulary_keeps_metadata() {
        let mut store = VocabStore::new();
        let (id, created) = store
            .find_or_create_vocabulary(VOCAB, || VocabularyDetails {
                label: "First".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(created);

        let (again, created) = store
            .find_or_create_vocabulary(VOCAB, || VocabularyDetails {
                label: "Second".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert!(!created);
        assert_eq!(id, again);
        assert_eq!(store.vocabulary(id).unwrap().label, "First");
    }

    #[test]
    fn test_unique_terms() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let first = store.create_term(vocab, "Thing").unwrap();
        assert!(matches!(
            store.create_term(vocab, "Thing"),
            Err(VocabError::IntegrityViolation(_))
        ));

        // a soft-deleted term frees its name
        store.delete_term(first).unwrap();
        let second = store.create_term(vocab, "Thing").unwrap();
        assert_ne!(first, second);
        assert_eq!(store.term_count(vocab), 1);
        assert!(matches!(store.restore_term(first), Err(VocabError::IntegrityViolation(_))));
    }

    #[test]
    fn test_term_uri() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        assert_eq!(store.term_uri(term).unwrap(), format!("{}Thing", VOCAB));
    }

    #[test]
    fn test_invalid_term_name() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        assert!(matches!(store.create_term(vocab, "a b"), Err(VocabError::Validation(_))));
        assert!(matches!(store.create_term(vocab, ""), Err(VocabError::Validation(_))));
    }

    #[test]
    fn test_soft_delete_term_cascades() {
        let (mut store, clock) = store_with_clock();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let property = store.create_property(term, label, "A thing").unwrap();

        clock.advance(Duration::minutes(1));
        store.delete_term(term).unwrap();

        assert_eq!(store.term_count(vocab), 0);
        assert!(store.terms(vocab, false).is_empty());
        assert_eq!(store.terms(vocab, true).len(), 1);
        assert!(store.properties(term, false).is_empty());

        let property = store.property(property).unwrap();
        assert_eq!(
            property.lifecycle,
            Lifecycle::SoftDeleted {
                at: clock.now(),
                by_cascade: true
            }
        );
        assert_eq!(property.modified, clock.now());
        // predicates are untouched
        assert!(store.predicate(label).is_ok());
        assert_eq!(store.usage_count(label), 1);
    }

    #[test]
    fn test_restore_term() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let kept = store.create_property(term, label, "kept").unwrap();
        let removed = store.create_property(term, label, "removed").unwrap();
        store.delete_property(removed).unwrap();
        store.delete_term(term).unwrap();

        store.restore_term(term).unwrap();
        assert_eq!(store.term_count(vocab), 1);
        assert!(store.property(kept).unwrap().is_live());
        assert!(!store.property(removed).unwrap().is_live());
    }

    #[test]
    fn test_delete_vocabulary_is_hard() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let gone = store.create_term(vocab, "Gone").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        store.create_property(term, label, "A thing").unwrap();
        store.delete_term(gone).unwrap();

        store.delete_vocabulary(vocab).unwrap();
        assert!(store.vocabulary(vocab).is_err());
        assert!(store.terms(vocab, true).is_empty());
        assert!(store.properties(term, true).is_empty());
        assert_eq!(store.property_count(true), 0);
        assert!(store.predicate(label).is_ok());
        assert!(store.vocabulary_by_uri(VOCAB).is_none());
    }

    #[test]
    fn test_predicate_protected_while_used() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let property = store.create_property(term, label, "A thing").unwrap();

        // soft-deleted properties still hold a reference
        store.delete_property(property).unwrap();
        assert!(matches!(
            store.delete_predicate(label),
            Err(VocabError::IntegrityViolation(_))
        ));

        store.hard_delete_property(property).unwrap();
        assert_eq!(store.usage_count(label), 0);
        store.delete_predicate(label).unwrap();
        assert!(store.predicate_by_uri(ns::RDFS_LABEL).is_none());
    }

    #[test]
    fn test_find_or_create_predicate_keeps_object_type() {
        let mut store = VocabStore::new();
        let (id, created) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        assert!(created);
        let (again, created) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::UriRef)
            .unwrap();
        assert!(!created);
        assert_eq!(id, again);
        assert_eq!(store.predicate(id).unwrap().object_type, ObjectType::Literal);
    }

    #[test]
    fn test_invalid_predicate_uri() {
        let mut store = VocabStore::new();
        assert!(store.create_predicate("not a uri", ObjectType::Literal).is_err());
        assert!(store.create_predicate("relative/path", ObjectType::Literal).is_err());
    }

    #[test]
    fn test_predicate_by_curie() {
        let mut store = VocabStore::new();
        let registry = PrefixRegistry::with_defaults();
        store.create_predicate(ns::RDFS_LABEL, ObjectType::Literal).unwrap();
        assert!(store.predicate_by_curie("rdfs:label", &registry).unwrap().is_some());
        assert!(store.predicate_by_curie(ns::RDFS_LABEL, &registry).unwrap().is_some());
        assert!(store.predicate_by_curie("rdfs:comment", &registry).unwrap().is_none());
        assert!(store.predicate_by_curie("rdfs:<bad>", &registry).is_err());
    }

    #[test]
    fn test_find_or_create_property() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let (first, created) = store.find_or_create_property(term, label, "A thing").unwrap();
        assert!(created);
        let (second, created) = store.find_or_create_property(term, label, "A thing").unwrap();
        assert!(!created);
        assert_eq!(first, second);
        let (_, created) = store.find_or_create_property(term, label, "Another").unwrap();
        assert!(created);
        assert_eq!(store.properties(term, false).len(), 2);
    }

    #[test]
    fn test_property_value_too_long() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.create_term(vocab, "Thing").unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let value = "x".repeat(MAX_VALUE_LEN + 1);
        assert!(matches!(
            store.create_property(term, label, &value),
            Err(VocabError::Validation(_))
        ));
    }

    #[test]
    fn test_add_term_with_type() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.add_term_with_type(vocab, "Thing", ns::RDFS_CLASS).unwrap();
        let rdf_type = store.predicate_by_uri(ns::RDF_TYPE).unwrap();
        assert_eq!(rdf_type.object_type, ObjectType::UriRef);
        let properties = store.properties(term, false);
        assert_eq!(properties.len(), 1);
        assert_eq!(properties[0].value, ns::RDFS_CLASS);

        // a duplicate name leaves nothing behind
        let before = store.property_count(true);
        assert!(store.add_term_with_type(vocab, "Thing", ns::RDFS_CLASS).is_err());
        assert_eq!(store.property_count(true), before);
    }

    #[test]
    fn test_property_value_views() {
        let mut store = VocabStore::new();
        let registry = PrefixRegistry::with_defaults();
        let vocab = vocabulary(&mut store);
        let term = store.add_term_with_type(vocab, "Thing", ns::RDFS_CLASS).unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();
        let typed = store.properties(term, false)[0].id;
        let literal = store.create_property(term, label, "rdfs:Class").unwrap();

        assert!(store.value_is_uri(typed).unwrap());
        assert_eq!(store.value_as_curie(typed, &registry).unwrap(), "rdfs:Class");
        assert_eq!(store.value_for_editing(typed, &registry).unwrap(), "rdfs:Class");

        assert!(!store.value_is_uri(literal).unwrap());
        assert_eq!(store.value_for_editing(literal, &registry).unwrap(), "rdfs:Class");
    }

    #[test]
    fn test_clean_value() {
        let mut store = VocabStore::new();
        let registry = PrefixRegistry::with_defaults();
        let (rdf_type, _) = store
            .find_or_create_predicate(ns::RDF_TYPE, ObjectType::UriRef)
            .unwrap();
        let (label, _) = store
            .find_or_create_predicate(ns::RDFS_LABEL, ObjectType::Literal)
            .unwrap();

        assert_eq!(
            store.clean_value(rdf_type, "rdfs:Class", &registry).unwrap(),
            ns::RDFS_CLASS
        );
        assert_eq!(
            store.clean_value(rdf_type, "urn:isbn:12345", &registry).unwrap(),
            "urn:isbn:12345"
        );
        assert!(store.clean_value(rdf_type, "has space", &registry).is_err());
        assert!(store.clean_value(rdf_type, "<bracketed>", &registry).is_err());
        assert_eq!(
            store.clean_value(label, "free text <ok>", &registry).unwrap(),
            "free text <ok>"
        );
    }

    #[test]
    fn test_vocabulary_updated() {
        let (mut store, clock) = store_with_clock();
        let vocab = vocabulary(&mut store);
        let created = clock.now();
        assert_eq!(store.vocabulary_updated(vocab).unwrap(), created);

        clock.advance(Duration::minutes(1));
        let term = store.create_term(vocab, "Thing").unwrap();
        assert_eq!(store.vocabulary_updated(vocab).unwrap(), clock.now());

        clock.advance(Duration::minutes(1));
        store.delete_term(term).unwrap();
        assert_eq!(store.vocabulary_updated(vocab).unwrap(), clock.now());
    }

    #[test]
    fn test_mark_published() {
        let (mut store, clock) = store_with_clock();
        let vocab = vocabulary(&mut store);
        clock.advance(Duration::minutes(5));
        let now = clock.now();
        store.mark_published(vocab, now).unwrap();
        let v = store.vocabulary(vocab).unwrap();
        assert_eq!(v.published, Some(now));
        assert_eq!(v.modified, now);

        clock.advance(Duration::minutes(5));
        store.clear_published(vocab).unwrap();
        let v = store.vocabulary(vocab).unwrap();
        assert_eq!(v.published, None);
        assert_eq!(v.modified, now);
    }

    #[test]
    fn test_transaction_rolls_back() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let result: VocabResult<()> = store.transaction(|s| {
            s.create_term(vocab, "One")?;
            s.create_term(vocab, "bad name")?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(store.term_count(vocab), 0);

        store
            .transaction(|s| s.create_term(vocab, "One").map(|_| ()))
            .unwrap();
        assert_eq!(store.term_count(vocab), 1);
    }

    #[test]
    fn test_snapshot_recovery() {
        let mut store = VocabStore::new();
        let vocab = vocabulary(&mut store);
        let term = store.add_term_with_type(vocab, "Thing", ns::RDFS_CLASS).unwrap();
        store.create_term(vocab, "Other").unwrap();

        let snapshot = store.snapshot();
        let mut recovered = VocabStore::from_snapshot(Arc::new(SystemClock), snapshot.clone()).unwrap();
        assert_eq!(recovered.snapshot(), snapshot);
        assert_eq!(recovered.term_uri(term).unwrap(), format!("{}Thing", VOCAB));

        // ids continue after the recovered ones
        let next = recovered.create_term(vocab, "Third").unwrap();
        assert!(next.as_u64() > term.as_u64());
    }
}
