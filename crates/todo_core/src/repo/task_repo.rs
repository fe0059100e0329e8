//! Task repository contracts and store-backed implementation.
//!
//! `list` is a linear scan over the whole collection followed by exact-value
//! matching. That is the known scaling boundary of this component and is
//! fine for personal lists in the low thousands of records.

use super::{from_record, to_record, ListResult, RepoError, RepoResult};
use crate::db::{Collection, StoreConnector};
use crate::model::task::Task;
use std::sync::Arc;

const COLLECTION: Collection = Collection::Tasks;

/// Partial-match filter; every populated field must equal the record's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub task_id: Option<String>,
    pub text: Option<String>,
    pub category: Option<String>,
    pub completed: Option<bool>,
    pub created_at: Option<i64>,
}

impl TaskFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.task_id.as_ref().map_or(true, |id| *id == task.task_id)
            && self.text.as_ref().map_or(true, |text| *text == task.text)
            && self
                .category
                .as_ref()
                .map_or(true, |category| *category == task.category)
            && self
                .completed
                .map_or(true, |completed| completed == task.completed)
            && self
                .created_at
                .map_or(true, |created_at| created_at == task.created_at)
    }
}

/// Repository interface for task CRUD.
pub trait TaskRepository {
    /// Linear scan returning every task accepted by `predicate`, in scan order.
    fn list_by(&self, predicate: &dyn Fn(&Task) -> bool) -> RepoResult<ListResult<Task>>;
    fn get_by_id(&self, id: &str) -> RepoResult<Task>;
    fn insert(&self, task: &Task) -> RepoResult<Task>;
    fn update(&self, task: &Task) -> RepoResult<Task>;
    fn delete(&self, id: &str) -> RepoResult<()>;

    fn list(&self, filter: &TaskFilter) -> RepoResult<ListResult<Task>> {
        self.list_by(&|task| filter.matches(task))
    }

    fn list_all(&self) -> RepoResult<ListResult<Task>> {
        self.list(&TaskFilter::default())
    }
}

/// Task repository over the shared record store.
#[derive(Clone)]
pub struct StoreTaskRepository {
    connector: Arc<StoreConnector>,
}

impl StoreTaskRepository {
    pub fn new(connector: Arc<StoreConnector>) -> Self {
        Self { connector }
    }
}

impl TaskRepository for StoreTaskRepository {
    fn list_by(&self, predicate: &dyn Fn(&Task) -> bool) -> RepoResult<ListResult<Task>> {
        let records = self.connector.open_collection(COLLECTION)?.get_all()?;
        let mut docs = Vec::new();
        for record in records {
            let task: Task = from_record(COLLECTION, record)?;
            if predicate(&task) {
                docs.push(task);
            }
        }
        Ok(ListResult::new(docs))
    }

    fn get_by_id(&self, id: &str) -> RepoResult<Task> {
        match self.connector.open_collection(COLLECTION)?.get(id)? {
            Some(record) => from_record(COLLECTION, record),
            None => Err(RepoError::NotFound {
                collection: COLLECTION,
                id: id.to_string(),
            }),
        }
    }

    fn insert(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;
        self.connector
            .open_collection(COLLECTION)?
            .add(to_record(task)?)?;
        Ok(task.clone())
    }

    fn update(&self, task: &Task) -> RepoResult<Task> {
        task.validate()?;
        self.connector
            .open_collection(COLLECTION)?
            .put(to_record(task)?)?;
        Ok(task.clone())
    }

    fn delete(&self, id: &str) -> RepoResult<()> {
        self.connector.open_collection(COLLECTION)?.delete(id)?;
        Ok(())
    }
}
