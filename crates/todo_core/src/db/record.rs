//! Record representation shared by all engines.

use super::{Collection, DbError, DbResult};
use serde_json::{Map, Value};

/// One stored object.
pub type Record = Map<String, Value>;

/// Reads the primary key from the collection's key-path field.
pub fn record_key(collection: Collection, record: &Record) -> DbResult<String> {
    match record.get(collection.key_path()) {
        Some(Value::String(key)) if !key.is_empty() => Ok(key.clone()),
        _ => Err(DbError::MissingKey {
            collection,
            key_path: collection.key_path(),
        }),
    }
}
