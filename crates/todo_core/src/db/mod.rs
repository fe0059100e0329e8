//! Local record store: engines, connector and schema migrations.
//!
//! # Responsibility
//! - Model a versioned, durable store with two keyed collections.
//! - Provide interchangeable engines (in-memory and SQLite file) behind
//!   [`RecordStore`].
//! - Hand out one shared engine handle through [`StoreConnector`].
//!
//! # Invariants
//! - Records are JSON objects whose primary key lives in the collection's
//!   key-path field.
//! - Scans return records in primary-key order.
//! - The store never assigns identifiers and never cascades writes.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

mod memory_store;
pub mod migrations;
mod open;
mod record;
mod sqlite_store;

pub use memory_store::MemoryRecordStore;
pub use open::{CollectionHandle, StoreConnector};
pub use record::{record_key, Record};
pub use sqlite_store::SqliteRecordStore;

pub type DbResult<T> = Result<T, DbError>;

/// Named collections provisioned by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Tasks,
    Categories,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Tasks, Collection::Categories];

    /// Stored collection name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Categories => "category",
        }
    }

    /// Record field holding the primary key.
    pub fn key_path(self) -> &'static str {
        match self {
            Self::Tasks => "task_id",
            Self::Categories => "category_id",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = DbError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|collection| collection.name() == value)
            .ok_or_else(|| DbError::UnknownCollection(value.to_string()))
    }
}

/// Storage engine contract.
///
/// Each call is one complete request. A request issued after a previous one
/// returned observes its effect.
pub trait RecordStore: Send + Sync {
    /// Short engine label used in diagnostics.
    fn engine(&self) -> &'static str;

    /// Schema version the engine is provisioned at.
    fn schema_version(&self) -> DbResult<u32>;

    fn get(&self, collection: Collection, key: &str) -> DbResult<Option<Record>>;

    /// Returns every record in primary-key order.
    fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>>;

    /// Inserts a new record; fails with [`DbError::KeyExists`] on collision.
    fn add(&self, collection: Collection, record: Record) -> DbResult<()>;

    /// Inserts or fully replaces the record under its key.
    fn put(&self, collection: Collection, record: Record) -> DbResult<()>;

    /// Removes the record; absent keys are not an error.
    fn delete(&self, collection: Collection, key: &str) -> DbResult<()>;
}

#[derive(Debug)]
pub enum DbError {
    /// The host denied storage access or the engine failed to start.
    StoreUnavailable(String),
    /// A collection was requested before `open()` completed.
    NotOpen,
    UnknownCollection(String),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    KeyExists {
        collection: Collection,
        key: String,
    },
    MissingKey {
        collection: Collection,
        key_path: &'static str,
    },
    CorruptRecord {
        collection: Collection,
        key: String,
        reason: String,
    },
    LockPoisoned(&'static str),
    Sqlite(rusqlite::Error),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreUnavailable(reason) => write!(f, "record store unavailable: {reason}"),
            Self::NotOpen => write!(f, "record store used before open"),
            Self::UnknownCollection(name) => write!(f, "unknown collection `{name}`"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::KeyExists { collection, key } => {
                write!(f, "key `{key}` already exists in `{collection}`")
            }
            Self::MissingKey {
                collection,
                key_path,
            } => write!(
                f,
                "record for `{collection}` has no string key at `{key_path}`"
            ),
            Self::CorruptRecord {
                collection,
                key,
                reason,
            } => write!(f, "corrupt record `{key}` in `{collection}`: {reason}"),
            Self::LockPoisoned(what) => write!(f, "{what} lock poisoned"),
            Self::Sqlite(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
