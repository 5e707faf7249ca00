//! Persistence layer for Grove
//!
//! The vocabulary store lives in memory. After every successful mutation
//! the whole store is checkpointed to RocksDB, and at startup it is
//! recovered from there.

pub mod storage;

pub use storage::{PersistentStorage, StorageError, StorageResult};

use crate::vocab::{Clock, VocabError, VocabStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Checkpoints and recovers a [`VocabStore`]
pub struct PersistenceManager {
    base_path: PathBuf,
    storage: Arc<PersistentStorage>,
}

impl PersistenceManager {
    /// Open (or create) the data directory
    pub fn new(base_path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let storage_path = base_path.join("data");
        std::fs::create_dir_all(&storage_path)?;

        info!("Initializing persistence manager at: {:?}", base_path);
        let storage = PersistentStorage::open(&storage_path)?;

        Ok(Self {
            base_path,
            storage: Arc::new(storage),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Rebuild the store from disk
    pub fn recover(&self, clock: Arc<dyn Clock>) -> PersistenceResult<VocabStore> {
        info!("Starting recovery from {:?}", self.base_path);
        let snapshot = self.storage.load_snapshot()?;
        info!(
            "Recovered {} vocabularies, {} terms, {} predicates, {} properties",
            snapshot.vocabularies.len(),
            snapshot.terms.len(),
            snapshot.predicates.len(),
            snapshot.properties.len()
        );
        Ok(VocabStore::from_snapshot(clock, snapshot)?)
    }

    /// Write the current state of the store to disk
    pub fn checkpoint(&self, store: &VocabStore) -> PersistenceResult<()> {
        self.storage.save_snapshot(&store.snapshot())?;
        self.storage.flush()?;
        info!("Checkpoint created successfully");
        Ok(())
    }

    pub fn storage(&self) -> &PersistentStorage {
        &self.storage
    }
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Stored rows do not fit together
    #[error("Recovery error: {0}")]
    Recovery(#[from] VocabError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
