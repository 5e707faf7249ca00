//! Vocabulary entities: Vocabulary, Term, Predicate, Property

use super::{VocabError, VocabResult};
use crate::rdf::{check_uri_chars, PrefixRegistry};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const MAX_URI_LEN: usize = 256;
pub const MAX_LABEL_LEN: usize = 256;
pub const MAX_DESCRIPTION_LEN: usize = 1024;
pub const MAX_PREFIX_LEN: usize = 32;
pub const MAX_VALUE_LEN: usize = 1024;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn new(id: u64) -> Self {
                $name(id)
            }

            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                $name(id)
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a vocabulary
    VocabularyId
);
entity_id!(
    /// Unique identifier for a term
    TermId
);
entity_id!(
    /// Unique identifier for a predicate
    PredicateId
);
entity_id!(
    /// Unique identifier for a property
    PropertyId
);

/// Whether a predicate's values are IRIs or literals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    UriRef,
    Literal,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::UriRef => "URIRef",
            ObjectType::Literal => "Literal",
        }
    }
}

impl FromStr for ObjectType {
    type Err = VocabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "URIRef" => Ok(ObjectType::UriRef),
            "Literal" => Ok(ObjectType::Literal),
            other => Err(VocabError::Validation(format!("Unknown object type: {}", other))),
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Soft-delete state of terms and properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    Live,
    SoftDeleted {
        at: DateTime<Utc>,
        /// Deleted because the owning term was deleted
        by_cascade: bool,
    },
}

impl Lifecycle {
    pub fn is_live(&self) -> bool {
        matches!(self, Lifecycle::Live)
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Live => None,
            Lifecycle::SoftDeleted { at, .. } => Some(*at),
        }
    }
}

/// Editable vocabulary metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyDetails {
    pub label: String,
    pub description: String,
    pub preferred_prefix: String,
}

impl VocabularyDetails {
    /// Metadata for a vocabulary nobody has described yet
    pub fn derived_from(uri: &str) -> Self {
        Self {
            label: default_label(uri),
            ..Default::default()
        }
    }
}

/// A named collection of terms rooted at a base URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub id: VocabularyId,
    pub uri: String,
    pub label: String,
    pub description: String,
    pub preferred_prefix: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// `None` = never published, or unpublished
    pub published: Option<DateTime<Utc>>,
}

impl Vocabulary {
    pub fn is_published(&self) -> bool {
        self.published.is_some()
    }

    /// Last path segment of the URI, used to name published files
    pub fn basename(&self) -> String {
        basename(&self.uri).to_string()
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// A named concept within a vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub id: TermId,
    pub vocabulary_id: VocabularyId,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Term {
    /// URI of this term under the given vocabulary URI
    pub fn uri_in(&self, vocabulary_uri: &str) -> String {
        format!("{}{}", vocabulary_uri, self.name)
    }

    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }
}

/// A globally shared relation type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    pub id: PredicateId,
    pub uri: String,
    /// Fixed at creation
    pub object_type: ObjectType,
}

impl Predicate {
    /// CURIE form, only when strictly shorter than the URI
    pub fn curie(&self, registry: &PrefixRegistry) -> Option<String> {
        registry.curie(&self.uri)
    }

    /// CURIE if there is one, otherwise the URI
    pub fn display_name(&self, registry: &PrefixRegistry) -> String {
        registry.shorten(&self.uri)
    }
}

/// An assertion attaching a value to a term via a predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub term_id: TermId,
    pub predicate_id: PredicateId,
    pub value: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub lifecycle: Lifecycle,
}

impl Property {
    pub fn is_live(&self) -> bool {
        self.lifecycle.is_live()
    }
}

fn vocabulary_uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^.+[/#]$").expect("static regex"))
}

fn term_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"^[^\s<>"{}|\\^`]+$"#).expect("static regex"))
}

/// Vocabulary URIs must be usable as namespaces
pub fn validate_vocabulary_uri(uri: &str) -> VocabResult<()> {
    if !vocabulary_uri_regex().is_match(uri) {
        return Err(VocabError::Validation(format!("{:?}: Must end with \"/\" or \"#\"", uri)));
    }
    check_uri_chars(uri).map_err(|e| VocabError::Validation(e.to_string()))?;
    check_len("uri", uri, MAX_URI_LEN)
}

pub fn validate_term_name(name: &str) -> VocabResult<()> {
    if !term_name_regex().is_match(name) {
        return Err(VocabError::Validation(format!(
            "{:?}: term names may not be empty or contain whitespace or <>\"{{}}|\\^`",
            name
        )));
    }
    check_len("name", name, MAX_URI_LEN)
}

pub fn validate_details(details: &VocabularyDetails) -> VocabResult<()> {
    check_len("label", &details.label, MAX_LABEL_LEN)?;
    check_len("description", &details.description, MAX_DESCRIPTION_LEN)?;
    check_len("preferred_prefix", &details.preferred_prefix, MAX_PREFIX_LEN)
}

pub(crate) fn check_len(field: &str, value: &str, max: usize) -> VocabResult<()> {
    if value.chars().count() > max {
        return Err(VocabError::Validation(format!(
            "{} is longer than {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Last path segment of a URI with trailing `/` or `#` stripped
pub fn basename(uri: &str) -> &str {
    let trimmed = uri.trim_end_matches(['/', '#']);
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Title-cased basename, the label of a vocabulary nobody has labelled
pub fn default_label(uri: &str) -> String {
    title_case(basename(uri))
}

/// Upper-case the first letter of every run of letters, lower-case the rest
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
