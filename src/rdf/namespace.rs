//! Namespace prefixes and CURIE conversion
//!
//! A [`PrefixRegistry`] is an ordered prefix → namespace mapping. It is built
//! once at startup and handed by reference to everything that needs to
//! shorten or expand IRIs.

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

/// Well-known namespace IRIs
pub mod ns {
    pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
    pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
    pub const DC: &str = "http://purl.org/dc/elements/1.1/";
    pub const DCTERMS: &str = "http://purl.org/dc/terms/";
    pub const FOAF: &str = "http://xmlns.com/foaf/0.1/";
    pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
    pub const VANN: &str = "http://purl.org/vocab/vann/";
    pub const SCHEMA: &str = "https://schema.org/";

    pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
    pub const RDFS_CLASS: &str = "http://www.w3.org/2000/01/rdf-schema#Class";
    pub const DC_DESCRIPTION: &str = "http://purl.org/dc/elements/1.1/description";
    pub const DC_IDENTIFIER: &str = "http://purl.org/dc/elements/1.1/identifier";
    pub const VANN_PREFERRED_PREFIX: &str = "http://purl.org/vocab/vann/preferredNamespacePrefix";
}

/// Characters that may never appear in a URI or CURIE
const RESERVED_CHARS: &[char] = &['<', '>', '"', '{', '}', '|', '\\', '^', '`'];

/// CURIE errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurieError {
    /// Empty input, whitespace or a reserved delimiter character
    #[error("Invalid URI or CURIE: {0:?}")]
    InvalidCurie(String),

    /// Looks like a CURIE, but no registered prefix matches
    #[error("Ambiguous or unknown prefix: {0}")]
    UnknownPrefix(String),
}

pub type CurieResult<T> = Result<T, CurieError>;

/// Namespace (prefix → IRI mapping)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Namespace {
    pub prefix: String,
    pub iri: String,
}

impl Namespace {
    pub fn new(prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            iri: iri.into(),
        }
    }
}

/// Reject strings that cannot be a URI or CURIE at all
pub fn check_uri_chars(value: &str) -> CurieResult<()> {
    if value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || RESERVED_CHARS.contains(&c))
    {
        return Err(CurieError::InvalidCurie(value.to_string()));
    }
    Ok(())
}

/// Split `prefix:local`. Absolute IRIs such as `http://...` are not CURIEs.
fn split_curie(value: &str) -> Option<(&str, &str)> {
    let (prefix, local) = value.split_once(':')?;
    if prefix.is_empty() || prefix.contains('/') || local.starts_with("//") {
        return None;
    }
    Some((prefix, local))
}

/// Local names must survive a round trip through Turtle and JSON-LD
fn is_valid_local_name(local: &str) -> bool {
    if local.is_empty() {
        return true;
    }
    let valid_char = |c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.';
    local.chars().all(valid_char) && !local.starts_with(['.', '-']) && !local.ends_with('.')
}

/// Ordered registry of namespace prefixes
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    prefixes: IndexMap<String, String>,
}

impl PrefixRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the common RDF vocabularies
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.add_prefix("rdf", ns::RDF);
        registry.add_prefix("rdfs", ns::RDFS);
        registry.add_prefix("xsd", ns::XSD);
        registry.add_prefix("owl", ns::OWL);
        registry.add_prefix("dc", ns::DC);
        registry.add_prefix("dcterms", ns::DCTERMS);
        registry.add_prefix("foaf", ns::FOAF);
        registry.add_prefix("skos", ns::SKOS);
        registry.add_prefix("vann", ns::VANN);
        registry.add_prefix("schema", ns::SCHEMA);
        registry
    }

    /// Add (or rebind) a prefix; rebinding keeps the original position
    pub fn add_prefix(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.prefixes.insert(prefix.into(), iri.into());
    }

    pub fn get_iri(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    /// Prefixes in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, i)| (p.as_str(), i.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// All namespaces sorted by prefix
    pub fn sorted(&self) -> Vec<Namespace> {
        let mut namespaces: Vec<Namespace> = self
            .iter()
            .map(|(prefix, iri)| Namespace::new(prefix, iri))
            .collect();
        namespaces.sort_by(|a, b| a.prefix.cmp(&b.prefix));
        namespaces
    }

    /// First registered namespace (in registry order) that `uri` starts with
    pub fn first_match(&self, uri: &str) -> Option<(&str, &str)> {
        self.iter().find(|(_, iri)| uri.starts_with(iri))
    }

    /// Compact `uri` to `prefix:local` if that is strictly shorter.
    ///
    /// When several namespaces match, the longest one wins, which yields the
    /// shortest CURIE.
    pub fn curie(&self, uri: &str) -> Option<String> {
        self.iter()
            .filter(|(_, iri)| !iri.is_empty() && uri.starts_with(iri))
            .filter(|(_, iri)| is_valid_local_name(&uri[iri.len()..]))
            .max_by_key(|(_, iri)| iri.len())
            .map(|(prefix, iri)| format!("{}:{}", prefix, &uri[iri.len()..]))
            .filter(|curie| curie.len() < uri.len())
    }

    /// CURIE form of `uri`, or `uri` itself when no shorter form exists
    pub fn shorten(&self, uri: &str) -> String {
        self.curie(uri).unwrap_or_else(|| uri.to_string())
    }

    /// Expand a CURIE using the registered prefixes.
    ///
    /// Fails with [`CurieError::InvalidCurie`] for reserved characters and
    /// with [`CurieError::UnknownPrefix`] for anything that does not start
    /// with a registered prefix, including absolute IRIs.
    pub fn expand(&self, value: &str) -> CurieResult<String> {
        check_uri_chars(value)?;
        let (prefix, local) =
            split_curie(value).ok_or_else(|| CurieError::UnknownPrefix(value.to_string()))?;
        let iri = self
            .get_iri(prefix)
            .ok_or_else(|| CurieError::UnknownPrefix(value.to_string()))?;
        Ok(format!("{}{}", iri, local))
    }

    /// Like [`expand`](Self::expand), but unknown prefixes fall back to the
    /// input (e.g. `http://example.com/x`, `urn:uuid:...`, `mailto:...`).
    pub fn expand_or_literal(&self, value: &str) -> CurieResult<String> {
        match self.expand(value) {
            Err(CurieError::UnknownPrefix(_)) => Ok(value.to_string()),
            other => other,
        }
    }
}

impl FromIterator<(String, String)> for PrefixRegistry {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            prefixes: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_prefixes() {
        let registry = PrefixRegistry::with_defaults();
        assert_eq!(registry.get_iri("rdf"), Some(ns::RDF));
        assert_eq!(registry.get_iri("rdfs"), Some(ns::RDFS));
        assert_eq!(registry.get_iri("vann"), Some(ns::VANN));
        assert_eq!(registry.get_iri("nope"), None);
    }

    #[test]
    fn test_expand() {
        let registry = PrefixRegistry::with_defaults();
        assert_eq!(registry.expand("rdf:type").unwrap(), ns::RDF_TYPE);
        assert_eq!(registry.expand("rdfs:Class").unwrap(), ns::RDFS_CLASS);
    }

    #[test]
    fn test_expand_unknown_prefix() {
        let registry = PrefixRegistry::with_defaults();
        assert!(matches!(
            registry.expand("ex:thing"),
            Err(CurieError::UnknownPrefix(_))
        ));
        assert!(matches!(
            registry.expand("http://example.com/thing"),
            Err(CurieError::UnknownPrefix(_))
        ));
        assert!(matches!(
            registry.expand("plainword"),
            Err(CurieError::UnknownPrefix(_))
        ));
    }

    #[test]
    fn test_expand_rejects_reserved_chars() {
        let registry = PrefixRegistry::with_defaults();
        for value in [
            "",
            "string with space",
            "<angle_bracketed>",
            "pipe|string",
            "{curly_brackets}",
            "\\escaped\\",
            "caret^string",
            "`backtick_string`",
            "quote\"d",
        ] {
            assert!(
                matches!(registry.expand(value), Err(CurieError::InvalidCurie(_))),
                "{:?} should be rejected",
                value
            );
        }
    }

    #[test]
    fn test_expand_or_literal() {
        let registry = PrefixRegistry::with_defaults();
        assert_eq!(registry.expand_or_literal("rdfs:Class").unwrap(), ns::RDFS_CLASS);
        for value in [
            "http://example.com/doc.html?q=foo#section",
            "urn:uuid:b2bce418-eb2f-4aa8-9678-b89438814449",
            "mailto:jdoe@example.com",
        ] {
            assert_eq!(registry.expand_or_literal(value).unwrap(), value);
        }
        assert!(registry.expand_or_literal("a b").is_err());
    }

    #[test]
    fn test_curie() {
        let registry = PrefixRegistry::with_defaults();
        assert_eq!(registry.curie(ns::RDF_TYPE).as_deref(), Some("rdf:type"));
        assert_eq!(registry.curie("http://example.com/foo"), None);
        // local part that would not survive as a CURIE
        assert_eq!(registry.curie("http://purl.org/dc/terms/a/b"), None);
    }

    #[test]
    fn test_curie_prefers_longest_namespace() {
        let mut registry = PrefixRegistry::new();
        registry.add_prefix("ex", "http://example.com/");
        registry.add_prefix("exv", "http://example.com/vocab#");
        assert_eq!(
            registry.shorten("http://example.com/vocab#Thing"),
            "exv:Thing"
        );
        assert_eq!(registry.shorten("http://example.com/Thing"), "ex:Thing");
    }

    #[test]
    fn test_curie_must_be_shorter() {
        let mut registry = PrefixRegistry::new();
        registry.add_prefix("averylongprefix", "http://a/");
        assert_eq!(registry.curie("http://a/b"), None);
        assert_eq!(registry.shorten("http://a/b"), "http://a/b");
    }

    #[test]
    fn test_shorten_expand_round_trip() {
        let registry = PrefixRegistry::with_defaults();
        for uri in [
            ns::RDF_TYPE,
            ns::RDFS_LABEL,
            ns::DC_IDENTIFIER,
            ns::VANN_PREFERRED_PREFIX,
            "http://www.w3.org/2002/07/owl#sameAs",
        ] {
            let short = registry.shorten(uri);
            assert!(short.len() <= uri.len());
            assert_eq!(registry.expand(&short).unwrap(), uri);
        }
    }

    #[test]
    fn test_first_match_uses_registry_order() {
        let mut registry = PrefixRegistry::new();
        registry.add_prefix("ex", "http://example.com/");
        registry.add_prefix("exv", "http://example.com/vocab#");
        assert_eq!(
            registry.first_match("http://example.com/vocab#Thing"),
            Some(("ex", "http://example.com/"))
        );
    }

    #[test]
    fn test_sorted() {
        let registry = PrefixRegistry::with_defaults();
        let sorted = registry.sorted();
        assert_eq!(sorted.len(), registry.len());
        assert!(sorted.windows(2).all(|w| w[0].prefix <= w[1].prefix));
    }
}
