//! In-memory engine for tests and ephemeral sessions.

use super::migrations::latest_version;
use super::record::record_key;
use super::{Collection, DbError, DbResult, Record, RecordStore};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Collections = BTreeMap<Collection, BTreeMap<String, Record>>;

/// Ordered-map engine; contents are lost when dropped.
#[derive(Debug)]
pub struct MemoryRecordStore {
    collections: RwLock<Collections>,
}

impl MemoryRecordStore {
    /// Creates an engine with every collection provisioned and empty.
    pub fn new() -> Self {
        let collections = Collection::ALL
            .into_iter()
            .map(|collection| (collection, BTreeMap::new()))
            .collect();
        Self {
            collections: RwLock::new(collections),
        }
    }

    fn read(&self) -> DbResult<RwLockReadGuard<'_, Collections>> {
        self.collections
            .read()
            .map_err(|_| DbError::LockPoisoned("memory store"))
    }

    fn write(&self) -> DbResult<RwLockWriteGuard<'_, Collections>> {
        self.collections
            .write()
            .map_err(|_| DbError::LockPoisoned("memory store"))
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryRecordStore {
    fn engine(&self) -> &'static str {
        "memory"
    }

    fn schema_version(&self) -> DbResult<u32> {
        Ok(latest_version())
    }

    fn get(&self, collection: Collection, key: &str) -> DbResult<Option<Record>> {
        let collections = self.read()?;
        Ok(collections
            .get(&collection)
            .and_then(|records| records.get(key))
            .cloned())
    }

    fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let collections = self.read()?;
        Ok(collections
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn add(&self, collection: Collection, record: Record) -> DbResult<()> {
        let key = record_key(collection, &record)?;
        let mut collections = self.write()?;
        let records = collections.entry(collection).or_default();
        if records.contains_key(&key) {
            return Err(DbError::KeyExists { collection, key });
        }
        records.insert(key, record);
        Ok(())
    }

    fn put(&self, collection: Collection, record: Record) -> DbResult<()> {
        let key = record_key(collection, &record)?;
        let mut collections = self.write()?;
        collections.entry(collection).or_default().insert(key, record);
        Ok(())
    }

    fn delete(&self, collection: Collection, key: &str) -> DbResult<()> {
        let mut collections = self.write()?;
        if let Some(records) = collections.get_mut(&collection) {
            records.remove(key);
        }
        Ok(())
    }
}
