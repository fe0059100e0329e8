//! Shared store connection with an explicit open/close lifecycle.
//!
//! # Responsibility
//! - Establish exactly one engine per connector, on demand.
//! - Hand out collection-scoped handles to repositories.
//!
//! # Invariants
//! - Concurrent `open()` calls coalesce into a single underlying open.
//! - `collection()` before `open()` fails with `DbError::NotOpen`.

use super::{
    Collection, DbError, DbResult, MemoryRecordStore, Record, RecordStore, SqliteRecordStore,
};
use crate::config::{StoreBackend, StoreConfig};
use log::{error, info};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

enum StoreSource {
    Config(StoreConfig),
    Provided(Arc<dyn RecordStore>),
}

/// Owner of the single engine handle shared by all repositories.
pub struct StoreConnector {
    source: StoreSource,
    handle: Mutex<Option<Arc<dyn RecordStore>>>,
    open_count: AtomicU64,
}

impl StoreConnector {
    /// Creates a closed connector that opens the engine described by `config`.
    pub fn new(config: StoreConfig) -> Self {
        Self::from_source(StoreSource::Config(config))
    }

    /// Creates a closed connector over a caller-supplied engine.
    pub fn with_store(store: Arc<dyn RecordStore>) -> Self {
        Self::from_source(StoreSource::Provided(store))
    }

    /// Shorthand for an in-memory connector.
    pub fn in_memory() -> Self {
        Self::new(StoreConfig::in_memory())
    }

    fn from_source(source: StoreSource) -> Self {
        Self {
            source,
            handle: Mutex::new(None),
            open_count: AtomicU64::new(0),
        }
    }

    /// Establishes the engine if needed. Idempotent.
    ///
    /// # Errors
    /// - `StoreUnavailable` when the engine cannot be started.
    /// - `UnsupportedSchemaVersion` when the stored schema is newer.
    pub fn open(&self) -> DbResult<()> {
        self.ensure_open().map(|_| ())
    }

    /// Drops the engine handle. Outstanding collection handles stay usable
    /// until they are dropped.
    pub fn close(&self) -> DbResult<()> {
        let mut handle = self.lock()?;
        if handle.take().is_some() {
            info!("event=store_close module=db status=ok");
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|handle| handle.is_some()).unwrap_or(false)
    }

    /// Number of underlying open operations performed so far.
    pub fn open_count(&self) -> u64 {
        self.open_count.load(Ordering::SeqCst)
    }

    /// Returns a read-write handle scoped to one collection.
    pub fn collection(&self, collection: Collection) -> DbResult<CollectionHandle> {
        let handle = self.lock()?;
        let store = handle.as_ref().ok_or(DbError::NotOpen)?;
        Ok(CollectionHandle {
            store: Arc::clone(store),
            collection,
        })
    }

    /// Like [`Self::collection`], resolving the collection by stored name.
    pub fn collection_named(&self, name: &str) -> DbResult<CollectionHandle> {
        self.collection(name.parse()?)
    }

    /// Opens if needed, then returns the collection handle.
    pub fn open_collection(&self, collection: Collection) -> DbResult<CollectionHandle> {
        let store = self.ensure_open()?;
        Ok(CollectionHandle { store, collection })
    }

    /// Schema version of the open engine.
    pub fn schema_version(&self) -> DbResult<u32> {
        let handle = self.lock()?;
        handle.as_ref().ok_or(DbError::NotOpen)?.schema_version()
    }

    fn ensure_open(&self) -> DbResult<Arc<dyn RecordStore>> {
        // Holding the lock across the open is what coalesces concurrent callers.
        let mut handle = self.lock()?;
        if let Some(store) = handle.as_ref() {
            return Ok(Arc::clone(store));
        }

        let started_at = Instant::now();
        let store = match self.start_engine() {
            Ok(store) => store,
            Err(err) => {
                error!(
                    "event=store_open module=db status=error duration_ms={} error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
        };
        let count = self.open_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "event=store_open module=db status=ok engine={} open_count={} duration_ms={}",
            store.engine(),
            count,
            started_at.elapsed().as_millis()
        );
        *handle = Some(Arc::clone(&store));
        Ok(store)
    }

    fn start_engine(&self) -> DbResult<Arc<dyn RecordStore>> {
        match &self.source {
            StoreSource::Provided(store) => Ok(Arc::clone(store)),
            StoreSource::Config(config) => match &config.backend {
                StoreBackend::Memory => Ok(Arc::new(MemoryRecordStore::new())),
                StoreBackend::File { .. } => {
                    config
                        .validate()
                        .map_err(|err| DbError::StoreUnavailable(err.to_string()))?;
                    let path = config.db_path().ok_or_else(|| {
                        DbError::StoreUnavailable("file backend without a path".to_string())
                    })?;
                    Ok(Arc::new(SqliteRecordStore::open(path)?))
                }
            },
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Option<Arc<dyn RecordStore>>>> {
        self.handle
            .lock()
            .map_err(|_| DbError::LockPoisoned("store connector"))
    }
}

/// Read-write view of one collection on a shared engine.
#[derive(Clone)]
pub struct CollectionHandle {
    store: Arc<dyn RecordStore>,
    collection: Collection,
}

impl CollectionHandle {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn get(&self, key: &str) -> DbResult<Option<Record>> {
        self.store.get(self.collection, key)
    }

    pub fn get_all(&self) -> DbResult<Vec<Record>> {
        self.store.get_all(self.collection)
    }

    pub fn add(&self, record: Record) -> DbResult<()> {
        self.store.add(self.collection, record)
    }

    pub fn put(&self, record: Record) -> DbResult<()> {
        self.store.put(self.collection, record)
    }

    pub fn delete(&self, key: &str) -> DbResult<()> {
        self.store.delete(self.collection, key)
    }
}
