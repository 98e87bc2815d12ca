//! redb-backed local key-value store
//!
//! One table, string keys, JSON values. Reads and writes are synchronous and
//! short; callers never hold a transaction across an `.await`.

use chrono::{DateTime, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Key-value table: key = well-known name, value = JSON
const KV_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// Well-known keys
pub mod keys {
    pub const CACHED_PARKING_LOTS: &str = "cachedParkingLots";
    pub const CACHED_RESERVATIONS: &str = "cachedReservations";
    pub const LAST_UPDATE_TIME: &str = "lastUpdateTime";
    pub const PENDING_MUTATIONS: &str = "pendingMutations";
    pub const PAYMENT_HISTORY: &str = "paymentHistory";
    pub const SAVED_CARDS: &str = "savedCards";
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable local state: caches, the offline queue and payment data
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open or create database
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Database::create(path)?)
    }

    /// Open in-memory database (tests, throwaway sessions)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db =
            Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(KV_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Read and decode a value
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(KV_TABLE)?;

        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_slice(guard.value())?)),
            None => Ok(None),
        }
    }

    /// Encode and write a value
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.insert(key, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(KV_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Read-modify-write of one key inside a single write transaction
    ///
    /// A missing key starts from `T::default()`.
    pub fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> StorageResult<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let write_txn = self.db.begin_write()?;
        let result = {
            let mut table = write_txn.open_table(KV_TABLE)?;
            let mut value: T = match table.get(key)? {
                Some(guard) => serde_json::from_slice(guard.value())?,
                None => T::default(),
            };
            let result = f(&mut value);
            let bytes = serde_json::to_vec(&value)?;
            table.insert(key, bytes.as_slice())?;
            result
        };
        write_txn.commit()?;
        Ok(result)
    }

    /// Stamp `lastUpdateTime` with `at`
    pub fn touch_last_update(&self, at: DateTime<Utc>) -> StorageResult<()> {
        self.put(keys::LAST_UPDATE_TIME, &at)
    }

    pub fn last_update(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.get(keys::LAST_UPDATE_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_remove() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get::<Vec<String>>("k").unwrap(), None);

        store.put("k", &vec!["a".to_string()]).unwrap();
        assert_eq!(store.get::<Vec<String>>("k").unwrap(), Some(vec!["a".into()]));

        store.remove("k").unwrap();
        assert_eq!(store.get::<Vec<String>>("k").unwrap(), None);
    }

    #[test]
    fn test_update_starts_from_default() {
        let store = LocalStore::open_in_memory().unwrap();
        let len = store
            .update(keys::SAVED_CARDS, |v: &mut Vec<u32>| {
                v.push(1);
                v.len()
            })
            .unwrap();
        assert_eq!(len, 1);
        assert_eq!(store.get::<Vec<u32>>(keys::SAVED_CARDS).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_update_reads_existing_value() {
        let store = LocalStore::open_in_memory().unwrap();
        store.put(keys::SAVED_CARDS, &vec![1u32, 2]).unwrap();
        let len = store
            .update(keys::SAVED_CARDS, |v: &mut Vec<u32>| {
                v.push(3);
                v.len()
            })
            .unwrap();
        assert_eq!(len, 3);
        assert_eq!(
            store.get::<Vec<u32>>(keys::SAVED_CARDS).unwrap(),
            Some(vec![1, 2, 3])
        );
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.redb");
        let now = Utc::now();
        {
            let store = LocalStore::open(&path).unwrap();
            store.touch_last_update(now).unwrap();
        }
        let store = LocalStore::open(&path).unwrap();
        assert_eq!(store.last_update().unwrap(), Some(now));
    }
}
