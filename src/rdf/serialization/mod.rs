//! RDF serialization formats
//!
//! Supports exactly four encodings:
//! - Turtle (`text/turtle`)
//! - N-Triples (`application/n-triples`)
//! - RDF/XML (`application/rdf+xml`)
//! - JSON-LD (`application/ld+json`)

mod jsonld;
mod rdfxml;
mod rio;
mod turtle;

use super::Triple;
use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use jsonld::{JsonLdParser, JsonLdSerializer};
pub use rdfxml::{RdfXmlParser, RdfXmlSerializer};
pub use turtle::{NTriplesParser, NTriplesSerializer, TurtleParser, TurtleSerializer};

/// Prefix → namespace mapping written alongside a serialized graph
pub type PrefixMap = IndexMap<String, String>;

/// RDF serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdfFormat {
    /// JSON-LD format (.jsonld)
    JsonLd,
    /// Turtle format (.ttl)
    Turtle,
    /// RDF/XML format (.xml)
    RdfXml,
    /// N-Triples format (.nt)
    NTriples,
}

/// An alias that names none of the supported formats
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown format: {0}")]
pub struct UnsupportedFormat(pub String);

impl RdfFormat {
    /// Every supported format, in publishing order
    pub const ALL: [RdfFormat; 4] = [
        RdfFormat::JsonLd,
        RdfFormat::Turtle,
        RdfFormat::RdfXml,
        RdfFormat::NTriples,
    ];

    /// Resolve a format alias or media type (case-insensitive)
    pub fn from_alias(alias: &str) -> Result<Self, UnsupportedFormat> {
        match alias.trim().to_ascii_lowercase().as_str() {
            "json-ld" | "jsonld" | "json" | "application/ld+json" => Ok(RdfFormat::JsonLd),
            "rdfxml" | "rdf/xml" | "rdf" | "xml" | "application/rdf+xml" => Ok(RdfFormat::RdfXml),
            "ttl" | "turtle" | "text/turtle" => Ok(RdfFormat::Turtle),
            "nt" | "ntriples" | "n-triples" | "application/n-triples" => Ok(RdfFormat::NTriples),
            _ => Err(UnsupportedFormat(alias.to_string())),
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            RdfFormat::JsonLd => "application/ld+json",
            RdfFormat::Turtle => "text/turtle",
            RdfFormat::RdfXml => "application/rdf+xml",
            RdfFormat::NTriples => "application/n-triples",
        }
    }

    pub fn charset(&self) -> &'static str {
        match self {
            RdfFormat::NTriples => "us-ascii",
            _ => "utf-8",
        }
    }

    /// `Content-Type` header value
    pub fn content_type(&self) -> String {
        format!("{}; charset={}", self.media_type(), self.charset())
    }

    /// File extension used for published files
    pub fn extension(&self) -> &'static str {
        match self {
            RdfFormat::JsonLd => "jsonld",
            RdfFormat::Turtle => "ttl",
            RdfFormat::RdfXml => "xml",
            RdfFormat::NTriples => "nt",
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            RdfFormat::JsonLd => "JSON-LD",
            RdfFormat::Turtle => "Turtle",
            RdfFormat::RdfXml => "RDF/XML",
            RdfFormat::NTriples => "N-Triples",
        }
    }
}

impl FromStr for RdfFormat {
    type Err = UnsupportedFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s)
    }
}

impl fmt::Display for RdfFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parse errors
#[derive(Error, Debug)]
pub enum ParseError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Syntax or model error in the input
    #[error("Parse error: {0}")]
    Parse(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Serialization errors
#[derive(Error, Debug)]
pub enum SerializeError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// RDF parser dispatching on [`RdfFormat`]
pub struct RdfParser;

impl RdfParser {
    /// Parse a whole document into triples.
    ///
    /// `base_iri` resolves relative IRIs in Turtle, RDF/XML and JSON-LD input.
    pub fn parse(input: &str, format: RdfFormat, base_iri: Option<&str>) -> ParseResult<Vec<Triple>> {
        match format {
            RdfFormat::Turtle => TurtleParser::parse(input, base_iri),
            RdfFormat::NTriples => NTriplesParser::parse(input),
            RdfFormat::RdfXml => RdfXmlParser::parse(input, base_iri),
            RdfFormat::JsonLd => JsonLdParser::parse(input, base_iri),
        }
    }
}

/// RDF serializer dispatching on [`RdfFormat`]
pub struct RdfSerializer;

impl RdfSerializer {
    /// Serialize triples, declaring the prefixes of `context` where the
    /// format has a place for them
    pub fn serialize(triples: &[Triple], context: &PrefixMap, format: RdfFormat) -> SerializeResult<String> {
        match format {
            RdfFormat::Turtle => TurtleSerializer::serialize(triples, context),
            RdfFormat::NTriples => NTriplesSerializer::serialize(triples),
            RdfFormat::RdfXml => RdfXmlSerializer::serialize(triples),
            RdfFormat::JsonLd => JsonLdSerializer::serialize(triples, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_aliases() {
        for alias in ["json", "jsonld", "json-ld", "application/ld+json"] {
            assert_eq!(RdfFormat::from_alias(alias).unwrap(), RdfFormat::JsonLd);
        }
        for alias in ["xml", "rdf", "rdfxml", "rdf/xml"] {
            let format = RdfFormat::from_alias(alias).unwrap();
            assert_eq!(format.media_type(), "application/rdf+xml");
        }
        for alias in ["ttl", "turtle", "text/turtle", "TURTLE"] {
            assert_eq!(RdfFormat::from_alias(alias).unwrap(), RdfFormat::Turtle);
        }
        for alias in ["nt", "ntriples", "n-triples"] {
            assert_eq!(RdfFormat::from_alias(alias).unwrap(), RdfFormat::NTriples);
        }
    }

    #[test]
    fn test_unknown_alias() {
        let err = RdfFormat::from_alias("UNKNOWN_FORMAT").unwrap_err();
        assert_eq!(err.to_string(), "Unknown format: UNKNOWN_FORMAT");
        assert!("yaml".parse::<RdfFormat>().is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            RdfFormat::NTriples.content_type(),
            "application/n-triples; charset=us-ascii"
        );
        assert_eq!(RdfFormat::Turtle.content_type(), "text/turtle; charset=utf-8");
    }

    #[test]
    fn test_extensions_are_distinct() {
        let mut extensions: Vec<_> = RdfFormat::ALL.iter().map(|f| f.extension()).collect();
        extensions.sort();
        extensions.dedup();
        assert_eq!(extensions, vec!["jsonld", "nt", "ttl", "xml"]);
    }

    #[test]
    fn test_parse_dispatch() {
        let input = r#"<http://example.org/a> <http://example.org/b> "c" ."#;
        let triples = RdfParser::parse(input, RdfFormat::NTriples, None).unwrap();
        assert_eq!(triples.len(), 1);
        let triples = RdfParser::parse(input, RdfFormat::Turtle, None).unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn test_mismatched_format_fails() {
        let input = r#"<http://example.org/a> <http://example.org/b> "c" ."#;
        assert!(RdfParser::parse(input, RdfFormat::RdfXml, None).is_err());
        assert!(RdfParser::parse(input, RdfFormat::JsonLd, None).is_err());
    }
}
