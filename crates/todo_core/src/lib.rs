//! Local task list core: record store, repositories and list controller.
//!
//! Data flows presentation -> [`ListController`] / [`CategoryService`] ->
//! repositories -> [`StoreConnector`] -> a [`RecordStore`] engine.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, StoreBackend, StoreConfig};
pub use db::{Collection, CollectionHandle, DbError, DbResult, RecordStore, StoreConnector};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::category::{Category, CategoryId, GENERAL_CATEGORY_ID, GENERAL_CATEGORY_NAME};
pub use model::task::{Task, TaskId, MAX_TASK_TEXT_CHARS};
pub use model::ValidationError;
pub use repo::category_repo::{CategoryFilter, CategoryRepository, StoreCategoryRepository};
pub use repo::task_repo::{StoreTaskRepository, TaskFilter, TaskRepository};
pub use repo::{ListResult, RepoError, RepoResult};
pub use service::category_service::{CategoryService, CategoryServiceError};
pub use service::clock::{Clock, SystemClock};
pub use service::list_controller::{
    CategoryLabel, CategoryScope, ControllerError, ControllerResult, ListController, ListQuery,
    SortDirection, SortKey, SortOrder, TaskListView, ALL_CATEGORIES,
};
pub use service::NoticeKind;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
