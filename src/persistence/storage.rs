//! RocksDB storage layer
//!
//! One column family per entity table. Rows are bincode-encoded and keyed by
//! their zero-padded hex id, so a scan returns them in id order.

use crate::vocab::{Predicate, Property, StoreSnapshot, Term, Vocabulary};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const CF_VOCABULARIES: &str = "vocabularies";
const CF_TERMS: &str = "terms";
const CF_PREDICATES: &str = "predicates";
const CF_PROPERTIES: &str = "properties";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// RocksDB error
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Column family error
    #[error("Column family error: {0}")]
    ColumnFamily(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// RocksDB-based persistent storage
pub struct PersistentStorage {
    db: Arc<DB>,
}

impl PersistentStorage {
    /// Open or create a new persistent storage
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        let path_str = path
            .to_str()
            .ok_or_else(|| StorageError::InvalidPath(path.display().to_string()))?;

        info!("Opening persistent storage at: {}", path_str);

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_VOCABULARIES, Self::table_cf_options()),
            ColumnFamilyDescriptor::new(CF_TERMS, Self::table_cf_options()),
            ColumnFamilyDescriptor::new(CF_PREDICATES, Self::table_cf_options()),
            ColumnFamilyDescriptor::new(CF_PROPERTIES, Self::table_cf_options()),
        ];

        let db = DB::open_cf_descriptors(&opts, path_str, cf_descriptors)?;

        info!("Persistent storage opened successfully");

        Ok(Self { db: Arc::new(db) })
    }

    fn table_cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    /// Replace every stored row with the rows of `snapshot` in one atomic
    /// write
    pub fn save_snapshot(&self, snapshot: &StoreSnapshot) -> StorageResult<()> {
        let mut batch = WriteBatch::default();

        self.replace_table(&mut batch, CF_VOCABULARIES, snapshot.vocabularies.iter().map(|v| (v.id.as_u64(), v)))?;
        self.replace_table(&mut batch, CF_TERMS, snapshot.terms.iter().map(|t| (t.id.as_u64(), t)))?;
        self.replace_table(&mut batch, CF_PREDICATES, snapshot.predicates.iter().map(|p| (p.id.as_u64(), p)))?;
        self.replace_table(&mut batch, CF_PROPERTIES, snapshot.properties.iter().map(|p| (p.id.as_u64(), p)))?;

        self.db.write(batch)?;

        debug!(
            "Stored {} vocabularies, {} terms, {} predicates, {} properties",
            snapshot.vocabularies.len(),
            snapshot.terms.len(),
            snapshot.predicates.len(),
            snapshot.properties.len()
        );
        Ok(())
    }

    /// Read every stored row
    pub fn load_snapshot(&self) -> StorageResult<StoreSnapshot> {
        Ok(StoreSnapshot {
            vocabularies: self.scan::<Vocabulary>(CF_VOCABULARIES)?,
            terms: self.scan::<Term>(CF_TERMS)?,
            predicates: self.scan::<Predicate>(CF_PREDICATES)?,
            properties: self.scan::<Property>(CF_PROPERTIES)?,
        })
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        debug!("Flushed storage to disk");
        Ok(())
    }

    fn replace_table<'a, T: Serialize + 'a>(
        &self,
        batch: &mut WriteBatch,
        table: &str,
        rows: impl Iterator<Item = (u64, &'a T)>,
    ) -> StorageResult<()> {
        let cf = self.db.cf_handle(table)
            .ok_or_else(|| StorageError::ColumnFamily(table.to_string()))?;

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item?;
            batch.delete_cf(&cf, key);
        }
        for (id, row) in rows {
            batch.put_cf(&cf, Self::row_key(id), bincode::serialize(row)?);
        }
        Ok(())
    }

    fn scan<T: DeserializeOwned>(&self, table: &str) -> StorageResult<Vec<T>> {
        let cf = self.db.cf_handle(table)
            .ok_or_else(|| StorageError::ColumnFamily(table.to_string()))?;

        let mut rows = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(bincode::deserialize(&value)?);
        }
        Ok(rows)
    }

    fn row_key(id: u64) -> Vec<u8> {
        format!("{:016x}", id).into_bytes()
    }
}
