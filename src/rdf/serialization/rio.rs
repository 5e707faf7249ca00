//! Conversion between the rio streaming model and our triples

use super::{ParseError, ParseResult};
use crate::rdf::{BlankNode, Literal, NamedNode, RdfObject, RdfPredicate, RdfSubject, Triple};
use oxiri::Iri;
use rio_api::model;
use rio_api::parser::TriplesParser;
use std::io;

/// Parse an optional base IRI for the rio parsers
pub(super) fn base_iri(base: Option<&str>) -> ParseResult<Option<Iri<String>>> {
    base.map(|b| Iri::parse(b.to_string()).map_err(|e| ParseError::Parse(format!("Invalid base IRI {}: {}", b, e))))
        .transpose()
}

/// Drain a rio parser into owned triples
pub(super) fn collect_triples<P>(mut parser: P) -> ParseResult<Vec<Triple>>
where
    P: TriplesParser,
    P::Error: From<io::Error>,
{
    let mut triples = Vec::new();
    parser
        .parse_all(&mut |t| -> Result<(), P::Error> {
            let triple = from_rio(t).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
            triples.push(triple);
            Ok(())
        })
        .map_err(|e| ParseError::Parse(e.to_string()))?;
    Ok(triples)
}

fn from_rio(t: model::Triple<'_>) -> ParseResult<Triple> {
    let subject = match t.subject {
        model::Subject::NamedNode(n) => RdfSubject::NamedNode(named(n.iri)?),
        model::Subject::BlankNode(b) => RdfSubject::BlankNode(blank(b.id)?),
        _ => return Err(ParseError::Parse("Unsupported subject type".to_string())),
    };

    let predicate = RdfPredicate::new(t.predicate.iri).map_err(|e| ParseError::Parse(e.to_string()))?;

    let object = match t.object {
        model::Term::NamedNode(n) => RdfObject::NamedNode(named(n.iri)?),
        model::Term::BlankNode(b) => RdfObject::BlankNode(blank(b.id)?),
        model::Term::Literal(model::Literal::Simple { value }) => {
            RdfObject::Literal(Literal::new_simple_literal(value))
        }
        model::Term::Literal(model::Literal::LanguageTaggedString { value, language }) => RdfObject::Literal(
            Literal::new_language_tagged_literal(value, language).map_err(|e| ParseError::Parse(e.to_string()))?,
        ),
        model::Term::Literal(model::Literal::Typed { value, datatype }) => {
            RdfObject::Literal(Literal::new_typed_literal(value, named(datatype.iri)?))
        }
        _ => return Err(ParseError::Parse("Unsupported object type".to_string())),
    };

    Ok(Triple::new(subject, predicate, object))
}

fn named(iri: &str) -> ParseResult<NamedNode> {
    NamedNode::new(iri).map_err(|e| ParseError::Parse(e.to_string()))
}

fn blank(id: &str) -> ParseResult<BlankNode> {
    BlankNode::from_id(id).map_err(|e| ParseError::Parse(e.to_string()))
}

/// Borrow one of our triples as a rio triple for the formatters
pub(super) fn to_rio(triple: &Triple) -> model::Triple<'_> {
    let subject = match &triple.subject {
        RdfSubject::NamedNode(n) => model::Subject::NamedNode(model::NamedNode { iri: n.as_str() }),
        RdfSubject::BlankNode(b) => model::Subject::BlankNode(model::BlankNode { id: b.as_str() }),
    };

    let object = match &triple.object {
        RdfObject::NamedNode(n) => model::Term::NamedNode(model::NamedNode { iri: n.as_str() }),
        RdfObject::BlankNode(b) => model::Term::BlankNode(model::BlankNode { id: b.as_str() }),
        RdfObject::Literal(l) => model::Term::Literal(match (l.language(), l.datatype()) {
            (Some(language), _) => model::Literal::LanguageTaggedString {
                value: l.value(),
                language,
            },
            (None, Some(datatype)) => model::Literal::Typed {
                value: l.value(),
                datatype: model::NamedNode { iri: datatype },
            },
            (None, None) => model::Literal::Simple { value: l.value() },
        }),
    };

    model::Triple {
        subject,
        predicate: model::NamedNode {
            iri: triple.predicate.as_str(),
        },
        object,
    }
}
