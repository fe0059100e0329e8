//! Repository layer over the record store.
//!
//! # Responsibility
//! - Map typed task/category records to and from stored objects.
//! - Provide CRUD and scan-and-filter operations per collection.
//!
//! # Invariants
//! - Every operation opens the shared store on demand.
//! - Write paths validate records before mutating the store.
//! - Read paths reject undecodable records instead of skipping them.
//! - `update` is a full-record upsert; callers pre-check existence when they
//!   need strict update semantics.

use crate::db::{Collection, DbError, Record};
use crate::model::ValidationError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod category_repo;
pub mod task_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { collection: Collection, id: String },
    DuplicateKey { collection: Collection, id: String },
    /// Mutation attempted on the read-time sentinel category.
    ReservedCategory(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { collection, id } => write!(f, "{collection} record not found: {id}"),
            Self::DuplicateKey { collection, id } => {
                write!(f, "{collection} record already exists: {id}")
            }
            Self::ReservedCategory(id) => write!(f, "category `{id}` is reserved"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::KeyExists { collection, key } => Self::DuplicateKey {
                collection,
                id: key,
            },
            other => Self::Db(other),
        }
    }
}

/// Scan result envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResult<T> {
    /// Matching records in scan order.
    pub docs: Vec<T>,
    pub total_docs: usize,
}

impl<T> ListResult<T> {
    pub fn new(docs: Vec<T>) -> Self {
        let total_docs = docs.len();
        Self { docs, total_docs }
    }
}

pub(crate) fn to_record<T: Serialize>(value: &T) -> RepoResult<Record> {
    match serde_json::to_value(value) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(RepoError::InvalidData(
            "record did not serialize to an object".to_string(),
        )),
        Err(err) => Err(RepoError::InvalidData(err.to_string())),
    }
}

pub(crate) fn from_record<T: DeserializeOwned>(
    collection: Collection,
    record: Record,
) -> RepoResult<T> {
    serde_json::from_value(Value::Object(record))
        .map_err(|err| RepoError::InvalidData(format!("{collection}: {err}")))
}
