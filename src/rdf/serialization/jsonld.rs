//! JSON-LD format implementation (Basic)
//!
//! The serializer writes a compacted document: an `@context` built from the
//! supplied prefixes and an `@graph` with one node object per subject.
//!
//! The parser implements the subset of JSON-LD expansion needed for
//! vocabulary documents: inline contexts (prefixes, `@vocab`, `@base`, term
//! definitions with `"@type": "@id"`), `@graph`, `@id`, `@type`, value
//! objects, nested node objects and `@list`/`@set` (flattened). Remote
//! contexts are rejected.

use super::{ParseError, ParseResult, PrefixMap, SerializeError, SerializeResult};
use crate::rdf::namespace::{ns, PrefixRegistry};
use crate::rdf::{BlankNode, Literal, NamedNode, RdfObject, RdfPredicate, RdfSubject, Triple};
use indexmap::IndexMap;
use oxiri::Iri;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

const MAX_TERM_DEPTH: usize = 8;

/// JSON-LD serializer
pub struct JsonLdSerializer;

impl JsonLdSerializer {
    /// Serialize triples to a compacted JSON-LD document
    pub fn serialize(triples: &[Triple], context: &PrefixMap) -> SerializeResult<String> {
        let registry: PrefixRegistry = context.iter().map(|(p, i)| (p.clone(), i.clone())).collect();

        // Group by subject, keeping first-seen order
        let mut nodes: IndexMap<String, IndexMap<String, Vec<Value>>> = IndexMap::new();

        for triple in triples {
            let subject = match &triple.subject {
                RdfSubject::NamedNode(n) => n.as_str().to_string(),
                RdfSubject::BlankNode(b) => b.to_string(),
            };
            let predicate = registry.shorten(triple.predicate.as_str());

            let value = match &triple.object {
                RdfObject::NamedNode(n) => json!({ "@id": registry.shorten(n.as_str()) }),
                RdfObject::BlankNode(b) => json!({ "@id": b.to_string() }),
                RdfObject::Literal(l) => match (l.language(), l.datatype()) {
                    (Some(lang), _) => json!({ "@value": l.value(), "@language": lang }),
                    (None, Some(dt)) => json!({ "@value": l.value(), "@type": registry.shorten(dt) }),
                    (None, None) => json!(l.value()),
                },
            };

            nodes
                .entry(subject)
                .or_default()
                .entry(predicate)
                .or_default()
                .push(value);
        }

        let graph: Vec<Value> = nodes
            .into_iter()
            .map(|(subject, properties)| {
                let mut node = Map::new();
                node.insert("@id".to_string(), Value::String(subject));
                for (predicate, mut values) in properties {
                    let value = if values.len() == 1 {
                        values.remove(0)
                    } else {
                        Value::Array(values)
                    };
                    node.insert(predicate, value);
                }
                Value::Object(node)
            })
            .collect();

        let mut document = Map::new();
        if !context.is_empty() {
            let ctx: Map<String, Value> = context
                .iter()
                .map(|(prefix, iri)| (prefix.clone(), Value::String(iri.clone())))
                .collect();
            document.insert("@context".to_string(), Value::Object(ctx));
        }
        document.insert("@graph".to_string(), Value::Array(graph));

        serde_json::to_string_pretty(&Value::Object(document)).map_err(|e| SerializeError::Serialize(e.to_string()))
    }
}

/// Term definition from an inline context
#[derive(Debug, Clone)]
struct TermDefinition {
    id: String,
    coerce_to_id: bool,
}

/// Active context during expansion
#[derive(Debug, Clone, Default)]
struct ActiveContext {
    terms: HashMap<String, TermDefinition>,
    vocab: Option<String>,
    base: Option<String>,
}

impl ActiveContext {
    fn merge(&self, local: &Value) -> ParseResult<ActiveContext> {
        match local {
            Value::Null => Ok(ActiveContext {
                base: self.base.clone(),
                ..ActiveContext::default()
            }),
            Value::Array(contexts) => contexts.iter().try_fold(self.clone(), |ctx, c| ctx.merge(c)),
            Value::Object(entries) => {
                let mut ctx = self.clone();
                for (key, value) in entries {
                    match key.as_str() {
                        "@vocab" => ctx.vocab = value.as_str().map(str::to_string),
                        "@base" => ctx.base = value.as_str().map(str::to_string),
                        k if k.starts_with('@') => {}
                        term => match value {
                            Value::Null => {
                                ctx.terms.remove(term);
                            }
                            Value::String(id) => {
                                ctx.terms.insert(
                                    term.to_string(),
                                    TermDefinition {
                                        id: id.clone(),
                                        coerce_to_id: false,
                                    },
                                );
                            }
                            Value::Object(def) => {
                                let id = def
                                    .get("@id")
                                    .and_then(Value::as_str)
                                    .unwrap_or(term)
                                    .to_string();
                                let coerce_to_id = matches!(
                                    def.get("@type").and_then(Value::as_str),
                                    Some("@id") | Some("@vocab")
                                );
                                ctx.terms.insert(term.to_string(), TermDefinition { id, coerce_to_id });
                            }
                            other => {
                                return Err(ParseError::Parse(format!(
                                    "Invalid term definition for {}: {}",
                                    term, other
                                )))
                            }
                        },
                    }
                }
                Ok(ctx)
            }
            Value::String(url) => Err(ParseError::Parse(format!("Remote contexts are not supported: {}", url))),
            other => Err(ParseError::Parse(format!("Invalid @context: {}", other))),
        }
    }

    fn coerces_to_id(&self, term: &str) -> bool {
        self.terms.get(term).map(|t| t.coerce_to_id).unwrap_or(false)
    }

    /// Expand a term, compact IRI or IRI; `None` means "drop it"
    fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        self.expand_iri_at(value, vocab, 0)
    }

    fn expand_iri_at(&self, value: &str, vocab: bool, depth: usize) -> Option<String> {
        if depth > MAX_TERM_DEPTH || value.starts_with('@') {
            return None;
        }
        if value.starts_with("_:") {
            return Some(value.to_string());
        }
        if vocab {
            if let Some(term) = self.terms.get(value) {
                if term.id == value {
                    return Some(value.to_string()).filter(|v| v.contains(':'));
                }
                return self.expand_iri_at(&term.id, vocab, depth + 1);
            }
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if !suffix.starts_with("//") {
                if let Some(term) = self.terms.get(prefix) {
                    let ns = self.expand_iri_at(&term.id, true, depth + 1)?;
                    return Some(format!("{}{}", ns, suffix));
                }
            }
            return Some(value.to_string());
        }
        if vocab {
            return self.vocab.as_ref().map(|v| format!("{}{}", v, value));
        }
        let base = Iri::parse(self.base.as_deref()?).ok()?;
        base.resolve(value).ok().map(Iri::into_inner)
    }
}

/// JSON-LD parser
pub struct JsonLdParser;

impl JsonLdParser {
    /// Parse a JSON-LD document into triples; relative `@id`s resolve
    /// against `base` unless the document sets its own `@base`
    pub fn parse(input: &str, base: Option<&str>) -> ParseResult<Vec<Triple>> {
        let document: Value = serde_json::from_str(input).map_err(|e| ParseError::Parse(e.to_string()))?;
        let initial = ActiveContext {
            base: base.map(str::to_string),
            ..ActiveContext::default()
        };
        let mut expander = Expander::default();
        expander.top_level(&document, &initial)?;
        Ok(expander.triples)
    }
}

#[derive(Default)]
struct Expander {
    triples: Vec<Triple>,
}

impl Expander {
    fn top_level(&mut self, value: &Value, ctx: &ActiveContext) -> ParseResult<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.top_level(item, ctx)?;
                }
                Ok(())
            }
            Value::Object(obj) => self.node(obj, ctx).map(|_| ()),
            other => Err(ParseError::Parse(format!("Expected a node object, found {}", other))),
        }
    }

    fn node(&mut self, obj: &Map<String, Value>, parent: &ActiveContext) -> ParseResult<Option<RdfSubject>> {
        let ctx = match obj.get("@context") {
            Some(local) => parent.merge(local)?,
            None => parent.clone(),
        };

        if let Some(graph) = obj.get("@graph") {
            self.top_level(graph, &ctx)?;
        }
        if !obj.keys().any(|k| k != "@context" && k != "@graph") {
            return Ok(None);
        }

        let subject = match obj.get("@id") {
            Some(Value::String(id)) => self.subject(id, &ctx)?,
            Some(other) => return Err(ParseError::Parse(format!("@id must be a string, found {}", other))),
            None => RdfSubject::BlankNode(BlankNode::fresh()),
        };

        for (key, value) in obj {
            match key.as_str() {
                "@type" => {
                    let rdf_type = RdfPredicate::new(ns::RDF_TYPE).map_err(|e| ParseError::Parse(e.to_string()))?;
                    for item in one_or_many(value) {
                        let type_iri = item
                            .as_str()
                            .and_then(|t| ctx.expand_iri(t, true))
                            .ok_or_else(|| ParseError::Parse(format!("Invalid @type value: {}", item)))?;
                        let object = self.reference(&type_iri)?;
                        self.triples.push(Triple::new(subject.clone(), rdf_type.clone(), object));
                    }
                }
                k if k.starts_with('@') => {}
                k => {
                    let Some(iri) = ctx.expand_iri(k, true) else {
                        continue;
                    };
                    if iri.starts_with("_:") {
                        continue;
                    }
                    let predicate = RdfPredicate::new(&iri).map_err(|e| ParseError::Parse(e.to_string()))?;
                    for object in self.objects(value, &ctx, ctx.coerces_to_id(k))? {
                        self.triples.push(Triple::new(subject.clone(), predicate.clone(), object));
                    }
                }
            }
        }

        Ok(Some(subject))
    }

    fn subject(&mut self, id: &str, ctx: &ActiveContext) -> ParseResult<RdfSubject> {
        if let Some(label) = id.strip_prefix("_:") {
            return BlankNode::from_id(label)
                .map(RdfSubject::from)
                .map_err(|e| ParseError::Parse(e.to_string()));
        }
        let iri = ctx
            .expand_iri(id, false)
            .ok_or_else(|| ParseError::Parse(format!("Cannot resolve @id: {}", id)))?;
        NamedNode::new(&iri)
            .map(RdfSubject::from)
            .map_err(|e| ParseError::Parse(e.to_string()))
    }

    fn reference(&self, iri: &str) -> ParseResult<RdfObject> {
        let object = match iri.strip_prefix("_:") {
            Some(label) => BlankNode::from_id(label).map(RdfObject::from),
            None => NamedNode::new(iri).map(RdfObject::from),
        };
        object.map_err(|e| ParseError::Parse(e.to_string()))
    }

    fn objects(&mut self, value: &Value, ctx: &ActiveContext, coerce_to_id: bool) -> ParseResult<Vec<RdfObject>> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => {
                let mut objects = Vec::new();
                for item in items {
                    objects.extend(self.objects(item, ctx, coerce_to_id)?);
                }
                Ok(objects)
            }
            Value::String(s) if coerce_to_id => {
                let iri = ctx
                    .expand_iri(s, false)
                    .ok_or_else(|| ParseError::Parse(format!("Cannot resolve IRI: {}", s)))?;
                Ok(vec![self.reference(&iri)?])
            }
            Value::String(s) => Ok(vec![Literal::new_simple_literal(s.as_str()).into()]),
            Value::Number(_) | Value::Bool(_) => Ok(vec![native_literal(value)?.into()]),
            Value::Object(obj) => {
                if let Some(inner) = obj.get("@value") {
                    return value_object(inner, obj, ctx).map(|l| l.into_iter().map(RdfObject::from).collect());
                }
                if let Some(inner) = obj.get("@list").or_else(|| obj.get("@set")) {
                    return self.objects(inner, ctx, coerce_to_id);
                }
                Ok(self
                    .node(obj, ctx)?
                    .map(|subject| match subject {
                        RdfSubject::NamedNode(n) => RdfObject::NamedNode(n),
                        RdfSubject::BlankNode(b) => RdfObject::BlankNode(b),
                    })
                    .into_iter()
                    .collect())
            }
        }
    }
}

fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn xsd(local: &str) -> ParseResult<NamedNode> {
    NamedNode::new(&format!("{}{}", ns::XSD, local)).map_err(|e| ParseError::Parse(e.to_string()))
}

/// Literal for a JSON number or boolean
fn native_literal(value: &Value) -> ParseResult<Literal> {
    match value {
        Value::Bool(b) => Ok(Literal::new_typed_literal(b.to_string(), xsd("boolean")?)),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Literal::new_typed_literal(n.to_string(), xsd("integer")?)),
        Value::Number(n) => Ok(Literal::new_typed_literal(n.to_string(), xsd("double")?)),
        other => Err(ParseError::Parse(format!("Not a native literal: {}", other))),
    }
}

/// Literal for a `{"@value": ...}` object; a null value yields nothing
fn value_object(inner: &Value, obj: &Map<String, Value>, ctx: &ActiveContext) -> ParseResult<Option<Literal>> {
    let lexical = match inner {
        Value::Null => return Ok(None),
        Value::String(s) => s.clone(),
        Value::Number(_) | Value::Bool(_) if !obj.contains_key("@type") => return native_literal(inner).map(Some),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => return Err(ParseError::Parse(format!("Invalid @value: {}", other))),
    };

    if let Some(language) = obj.get("@language").and_then(Value::as_str) {
        return Literal::new_language_tagged_literal(lexical, language)
            .map(Some)
            .map_err(|e| ParseError::Parse(e.to_string()));
    }
    if let Some(datatype) = obj.get("@type").and_then(Value::as_str) {
        let iri = ctx
            .expand_iri(datatype, true)
            .ok_or_else(|| ParseError::Parse(format!("Cannot resolve datatype: {}", datatype)))?;
        let datatype = NamedNode::new(&iri).map_err(|e| ParseError::Parse(e.to_string()))?;
        return Ok(Some(Literal::new_typed_literal(lexical, datatype)));
    }
    Ok(Some(Literal::new_simple_literal(lexical)))
}
