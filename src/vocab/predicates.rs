//! Bulk predicate loader
//!
//! Reads a two-column CSV file:
//!
//! ```text
//! predicate,object_type
//! rdfs:label,Literal
//! http://www.w3.org/2002/07/owl#sameAs,URIRef
//! ```
//!
//! and find-or-creates a predicate per row. Either every row is loaded or
//! none is.

use super::model::ObjectType;
use super::store::VocabStore;
use crate::rdf::PrefixRegistry;
use serde::Serialize;
use std::io::{BufRead, BufReader};
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const HEADER: [&str; 2] = ["predicate", "object_type"];

/// Predicate loading errors
#[derive(Error, Debug)]
pub enum PredicateLoadError {
    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("Invalid file: {0}")]
    InvalidFile(String),
}

pub type PredicateLoadResult<T> = Result<T, PredicateLoadError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PredicateLoadSummary {
    pub rows: usize,
    pub created: usize,
}

/// Load predicates from a CSV file on disk
pub fn load_predicates_file(
    path: impl AsRef<Path>,
    registry: &PrefixRegistry,
    store: &mut VocabStore,
) -> PredicateLoadResult<PredicateLoadSummary> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| PredicateLoadError::InvalidFile(format!("{}: {}", path.display(), e)))?;
    load_predicates(BufReader::new(file), registry, store)
}

/// Load predicates from CSV text with a `predicate,object_type` header
pub fn load_predicates(
    reader: impl BufRead,
    registry: &PrefixRegistry,
    store: &mut VocabStore,
) -> PredicateLoadResult<PredicateLoadSummary> {
    let mut rows = Vec::new();
    let mut header_seen = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| PredicateLoadError::InvalidFile(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_row(&line);
        let line_number = index + 1;

        if !header_seen {
            if fields != HEADER {
                return Err(PredicateLoadError::InvalidCsv(format!(
                    "expected header \"{}\", found {:?}",
                    HEADER.join(","),
                    line
                )));
            }
            header_seen = true;
            continue;
        }

        let [predicate, object_type] = fields.as_slice() else {
            return Err(PredicateLoadError::InvalidCsv(format!(
                "line {}: expected 2 columns, found {}",
                line_number,
                fields.len()
            )));
        };
        let uri = registry
            .expand_or_literal(predicate)
            .map_err(|e| PredicateLoadError::InvalidCsv(format!("line {}: {}", line_number, e)))?;
        let object_type: ObjectType = object_type
            .parse()
            .map_err(|e| PredicateLoadError::InvalidCsv(format!("line {}: {}", line_number, e)))?;
        debug!("Row {}: {}, {}", line_number, uri, object_type);
        rows.push((line_number, uri, object_type));
    }

    let summary = store.transaction(|store| {
        let mut summary = PredicateLoadSummary::default();
        for (line_number, uri, object_type) in &rows {
            let (_, created) = store
                .find_or_create_predicate(uri, *object_type)
                .map_err(|e| PredicateLoadError::InvalidCsv(format!("line {}: {}", line_number, e)))?;
            summary.rows += 1;
            if created {
                summary.created += 1;
            }
        }
        Ok::<_, PredicateLoadError>(summary)
    })?;

    info!("Loaded {} predicates ({} new)", summary.rows, summary.created);
    Ok(summary)
}

/// Comma-separated fields, trimmed, with surrounding double quotes removed
fn split_row(line: &str) -> Vec<&str> {
    line.split(',')
        .map(|field| {
            let field = field.trim();
            field
                .strip_prefix('"')
                .and_then(|f| f.strip_suffix('"'))
                .unwrap_or(field)
        })
        .collect()
}
