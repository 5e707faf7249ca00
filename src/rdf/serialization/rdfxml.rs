//! RDF/XML via rio_xml

use super::rio::{base_iri, collect_triples, to_rio};
use super::{ParseResult, SerializeError, SerializeResult};
use crate::rdf::Triple;
use rio_api::formatter::TriplesFormatter;
use rio_xml::RdfXmlFormatter;

/// RDF/XML parser
pub struct RdfXmlParser;

impl RdfXmlParser {
    pub fn parse(input: &str, base: Option<&str>) -> ParseResult<Vec<Triple>> {
        collect_triples(rio_xml::RdfXmlParser::new(input.as_bytes(), base_iri(base)?))
    }
}

/// RDF/XML serializer
pub struct RdfXmlSerializer;

impl RdfXmlSerializer {
    pub fn serialize(triples: &[Triple]) -> SerializeResult<String> {
        let mut output = Vec::new();
        let mut formatter = RdfXmlFormatter::new(&mut output)?;
        for triple in triples {
            formatter.format(&to_rio(triple))?;
        }
        formatter.finish()?;

        String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))
    }
}
