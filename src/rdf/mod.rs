//! RDF support for Grove
//!
//! This module provides the pieces the vocabulary engine is built on:
//! - RDF terms and triples (thin wrappers over oxrdf)
//! - Namespace prefixes and CURIE conversion
//! - Parsing and serialization (Turtle, RDF/XML, N-Triples, JSON-LD)
//!
//! # Example
//!
//! ```rust
//! use grove::rdf::{PrefixRegistry, RdfFormat};
//!
//! let registry = PrefixRegistry::with_defaults();
//! let curie = registry.shorten("http://www.w3.org/2000/01/rdf-schema#label");
//! assert_eq!(curie, "rdfs:label");
//! assert_eq!(registry.expand(&curie).unwrap(), "http://www.w3.org/2000/01/rdf-schema#label");
//!
//! let format = RdfFormat::from_alias("ttl").unwrap();
//! assert_eq!(format.media_type(), "text/turtle");
//! ```

pub mod namespace;
pub mod serialization;
mod types;

pub use types::{BlankNode, Literal, NamedNode, RdfError, RdfObject, RdfPredicate, RdfResult, RdfSubject, Triple};

pub use namespace::{check_uri_chars, ns, CurieError, CurieResult, Namespace, PrefixRegistry};

pub use serialization::{
    ParseError, ParseResult, PrefixMap, RdfFormat, RdfParser, RdfSerializer, SerializeError, SerializeResult,
    UnsupportedFormat,
};
