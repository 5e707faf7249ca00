//! Turtle and N-Triples via rio_turtle

use super::rio::{base_iri, collect_triples, to_rio};
use super::{ParseResult, PrefixMap, SerializeError, SerializeResult};
use crate::rdf::Triple;
use rio_api::formatter::TriplesFormatter;
use rio_turtle::{NTriplesFormatter, TurtleFormatter};
use std::io::Write;

/// Turtle parser
pub struct TurtleParser;

impl TurtleParser {
    pub fn parse(input: &str, base: Option<&str>) -> ParseResult<Vec<Triple>> {
        collect_triples(rio_turtle::TurtleParser::new(input.as_bytes(), base_iri(base)?))
    }
}

/// N-Triples parser
pub struct NTriplesParser;

impl NTriplesParser {
    pub fn parse(input: &str) -> ParseResult<Vec<Triple>> {
        collect_triples(rio_turtle::NTriplesParser::new(input.as_bytes()))
    }
}

/// Turtle serializer
pub struct TurtleSerializer;

impl TurtleSerializer {
    /// Serialize triples to Turtle, with an `@prefix` line per context entry
    pub fn serialize(triples: &[Triple], context: &PrefixMap) -> SerializeResult<String> {
        let mut output = Vec::new();
        for (prefix, iri) in context {
            writeln!(output, "@prefix {}: <{}> .", prefix, iri)?;
        }
        if !context.is_empty() {
            writeln!(output)?;
        }

        let mut formatter = TurtleFormatter::new(&mut output);
        for triple in triples {
            formatter.format(&to_rio(triple))?;
        }
        formatter.finish()?;

        String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))
    }
}

/// N-Triples serializer
pub struct NTriplesSerializer;

impl NTriplesSerializer {
    /// Serialize triples to N-Triples. The output is pure ASCII: every other
    /// character is written as a `\uXXXX` or `\UXXXXXXXX` escape.
    pub fn serialize(triples: &[Triple]) -> SerializeResult<String> {
        let mut output = Vec::new();
        let mut formatter = NTriplesFormatter::new(&mut output);
        for triple in triples {
            formatter.format(&to_rio(triple))?;
        }
        formatter.finish()?;

        let text = String::from_utf8(output).map_err(|e| SerializeError::Serialize(e.to_string()))?;
        Ok(escape_non_ascii(&text))
    }
}

fn escape_non_ascii(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c as u32 {
            0..=0x7F => escaped.push(c),
            code @ 0x80..=0xFFFF => escaped.push_str(&format!("\\u{:04X}", code)),
            code => escaped.push_str(&format!("\\U{:08X}", code)),
        }
    }
    escaped
}
