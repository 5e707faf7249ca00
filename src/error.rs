//! Top-level error type for callers that drive several subsystems

use crate::config::ConfigError;
use crate::persistence::{PersistenceError, StorageError};
use crate::rdf::{CurieError, UnsupportedFormat};
use crate::vocab::{ExportError, ImportError, PredicateLoadError, PublishError, VocabError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroveError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),

    #[error("{0}")]
    IntegrityViolation(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Import(ImportError),

    #[error(transparent)]
    Publish(PublishError),

    #[error(transparent)]
    PredicateLoad(#[from] PredicateLoadError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Anything else, e.g. a serializer failure
    #[error("{0}")]
    Internal(String),
}

pub type GroveResult<T> = Result<T, GroveError>;

impl GroveError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            GroveError::Validation(_) => 400,
            GroveError::UnsupportedFormat(_) => 406,
            GroveError::IntegrityViolation(_) => 409,
            GroveError::NotFound(_) => 404,
            GroveError::Import(_) | GroveError::PredicateLoad(_) => 400,
            GroveError::Publish(_)
            | GroveError::Persistence(_)
            | GroveError::Config(_)
            | GroveError::Internal(_) => 500,
        }
    }
}

impl From<VocabError> for GroveError {
    fn from(e: VocabError) -> Self {
        match e {
            VocabError::Validation(msg) => GroveError::Validation(msg),
            VocabError::IntegrityViolation(msg) => GroveError::IntegrityViolation(msg),
            VocabError::NotFound(msg) => GroveError::NotFound(msg),
        }
    }
}

impl From<CurieError> for GroveError {
    fn from(e: CurieError) -> Self {
        GroveError::Validation(e.to_string())
    }
}

impl From<ImportError> for GroveError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Vocab(e @ VocabError::NotFound(_)) => e.into(),
            other => GroveError::Import(other),
        }
    }
}

impl From<ExportError> for GroveError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Vocab(e) => e.into(),
            ExportError::Serialize(e) => GroveError::Internal(e.to_string()),
        }
    }
}

impl From<PublishError> for GroveError {
    fn from(e: PublishError) -> Self {
        match e {
            PublishError::Vocab(e) => e.into(),
            other => GroveError::Publish(other),
        }
    }
}

impl From<StorageError> for GroveError {
    fn from(e: StorageError) -> Self {
        GroveError::Persistence(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GroveError::from(VocabError::Validation("x".into())).status_code(), 400);
        assert_eq!(GroveError::from(VocabError::IntegrityViolation("x".into())).status_code(), 409);
        assert_eq!(GroveError::from(VocabError::NotFound("x".into())).status_code(), 404);
        assert_eq!(
            GroveError::from(UnsupportedFormat("bogus".into())).status_code(),
            406
        );
        assert_eq!(
            GroveError::from(ImportError::UnsupportedFormat(UnsupportedFormat("bogus".into()))).status_code(),
            400
        );
    }

    #[test]
    fn test_publish_not_found_is_404() {
        let err = GroveError::from(PublishError::Vocab(VocabError::NotFound("VocabularyId(9)".into())));
        assert_eq!(err.status_code(), 404);
    }
}
