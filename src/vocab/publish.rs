//! Publishing and staleness tracking
//!
//! A vocabulary is `Unpublished` until it is published, `Published` while
//! nothing in it has changed since, and `Stale` once anything has.
//! Publishing writes `{basename}.{ext}` for every format to the output
//! directory, then stamps the vocabulary.

use super::exporter::{serialize_vocabulary, ExportError};
use super::model::{Vocabulary, VocabularyId};
use super::store::VocabStore;
use super::{VocabError, VocabResult};
use crate::rdf::{PrefixRegistry, RdfFormat, SerializeError};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Publish errors
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Unable to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] SerializeError),

    #[error(transparent)]
    Vocab(#[from] VocabError),
}

pub type PublishResult<T> = Result<T, PublishError>;

impl From<ExportError> for PublishError {
    fn from(e: ExportError) -> Self {
        match e {
            ExportError::Vocab(e) => PublishError::Vocab(e),
            ExportError::Serialize(e) => PublishError::Serialize(e),
        }
    }
}

/// Where a vocabulary stands relative to its published files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PublicationState {
    Unpublished,
    Published,
    /// Published, but changed since
    Stale,
}

/// Writes published vocabularies to a directory
#[derive(Debug, Clone)]
pub struct Publisher {
    output_dir: PathBuf,
}

impl Publisher {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `{output_dir}/{basename}.{ext}`
    pub fn output_path(&self, vocabulary: &Vocabulary, format: RdfFormat) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", vocabulary.basename(), format.extension()))
    }

    pub fn output_paths(&self, vocabulary: &Vocabulary) -> Vec<PathBuf> {
        RdfFormat::ALL
            .iter()
            .map(|format| self.output_path(vocabulary, *format))
            .collect()
    }

    /// Write every format, then set the published and modified timestamps
    /// to the same instant. If any file cannot be written the timestamps are
    /// left as they were.
    pub fn publish(
        &self,
        store: &mut VocabStore,
        vocabulary_id: VocabularyId,
        registry: &PrefixRegistry,
    ) -> PublishResult<Vec<PathBuf>> {
        let vocabulary = store.vocabulary(vocabulary_id)?;

        let mut documents = Vec::with_capacity(RdfFormat::ALL.len());
        for format in RdfFormat::ALL {
            let document = serialize_vocabulary(store, vocabulary_id, registry, format)?;
            documents.push((self.output_path(vocabulary, format), document));
        }

        fs::create_dir_all(&self.output_dir).map_err(|source| PublishError::Io {
            path: self.output_dir.clone(),
            source,
        })?;
        write_all(&documents)?;

        let paths: Vec<PathBuf> = documents.into_iter().map(|(path, _)| path).collect();
        let now = store.now();
        store.mark_published(vocabulary_id, now)?;

        info!("Published {} to {}", store.vocabulary(vocabulary_id)?.uri, self.output_dir.display());
        Ok(paths)
    }

    /// Clear the published timestamp and remove the published files.
    /// Files that are already gone are not an error.
    pub fn unpublish(&self, store: &mut VocabStore, vocabulary_id: VocabularyId) -> PublishResult<()> {
        let paths = self.output_paths(store.vocabulary(vocabulary_id)?);
        for path in &paths {
            match fs::remove_file(path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(PublishError::Io {
                        path: path.clone(),
                        source,
                    })
                }
            }
        }
        store.clear_published(vocabulary_id)?;
        info!("Unpublished {}", store.vocabulary(vocabulary_id)?.uri);
        Ok(())
    }
}

/// Stage every document next to its target, then move them into place
fn write_all(documents: &[(PathBuf, String)]) -> PublishResult<()> {
    let staged: Vec<(PathBuf, &PathBuf)> = documents
        .iter()
        .map(|(path, _)| (staging_path(path), path))
        .collect();

    let result = documents
        .iter()
        .zip(&staged)
        .try_for_each(|((_, document), (temp, _))| write_file(temp, document.as_bytes()))
        .and_then(|()| {
            staged.iter().try_for_each(|(temp, path)| {
                fs::rename(temp, path).map_err(|source| PublishError::Io {
                    path: (*path).clone(),
                    source,
                })
            })
        });

    if result.is_err() {
        for (temp, _) in &staged {
            if let Err(e) = fs::remove_file(temp) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Unable to remove {}: {}", temp.display(), e);
                }
            }
        }
    }
    result
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_file(path: &Path, contents: &[u8]) -> PublishResult<()> {
    fs::write(path, contents).map_err(|source| PublishError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Whether the vocabulary has a published timestamp
pub fn is_published(store: &VocabStore, vocabulary_id: VocabularyId) -> VocabResult<bool> {
    Ok(store.vocabulary(vocabulary_id)?.is_published())
}

/// Whether the vocabulary has changes that are not yet published
pub fn has_updated(store: &VocabStore, vocabulary_id: VocabularyId) -> VocabResult<bool> {
    Ok(publication_state(store, vocabulary_id)? != PublicationState::Published)
}

pub fn publication_state(store: &VocabStore, vocabulary_id: VocabularyId) -> VocabResult<PublicationState> {
    let Some(published) = store.vocabulary(vocabulary_id)?.published else {
        return Ok(PublicationState::Unpublished);
    };
    if store.vocabulary_updated(vocabulary_id)? > published {
        Ok(PublicationState::Stale)
    } else {
        Ok(PublicationState::Published)
    }
}
