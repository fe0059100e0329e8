//! Task list controller: working set, query parameters and derived views.
//!
//! # Responsibility
//! - Own the in-memory working set fetched from the task repository.
//! - Apply search, category filter and sort, then partition into pending and
//!   completed views.
//! - Run add/toggle/edit/remove workflows and refresh views after each one.
//!
//! # Invariants
//! - Search is a case-insensitive substring match on task text; an empty
//!   query matches everything.
//! - Category filtering is exact; [`CategoryScope::All`] disables it.
//! - Sorting is stable in both directions; ties keep scan order.
//! - A failed operation is logged and leaves working set, categories and
//!   view untouched.

use super::clock::{Clock, SystemClock};
use super::{repo_error_code, repo_notice_kind, NoticeKind};
use crate::model::category::{Category, GENERAL_CATEGORY_ID};
use crate::model::task::{validate_task_text, Task, TaskId};
use crate::model::ValidationError;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::task_repo::TaskRepository;
use crate::repo::RepoError;
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

/// Sentinel choice meaning "no category filter".
pub const ALL_CATEGORIES: &str = "All";

/// Category filter applied to the working set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryScope {
    #[default]
    All,
    Category(String),
}

impl CategoryScope {
    /// Maps a selection value, treating [`ALL_CATEGORIES`] as no filter.
    pub fn from_choice(choice: &str) -> Self {
        if choice == ALL_CATEGORIES {
            Self::All
        } else {
            Self::Category(choice.to_string())
        }
    }

    fn admits(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Category(category) => task.category == *category,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn created_at(direction: SortDirection) -> Self {
        Self {
            key: SortKey::CreatedAt,
            direction,
        }
    }

    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Search, filter and sort parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub search_query: String,
    pub category: CategoryScope,
    pub sort: SortOrder,
}

/// Derived view published to presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListView {
    pub pending: Vec<Task>,
    pub completed: Vec<Task>,
    pub loading: bool,
}

/// How a task's category should be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryLabel {
    Named(String),
    /// The referenced category no longer exists.
    Uncategorized,
}

#[derive(Debug)]
pub enum ControllerError {
    Validation(ValidationError),
    /// Task is not in the working set or the store.
    TaskNotFound(TaskId),
    Repo(RepoError),
}

impl ControllerError {
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::Validation(_) => NoticeKind::Inline,
            Self::TaskNotFound(_) => NoticeKind::Transient,
            Self::Repo(err) => repo_notice_kind(err),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::TaskNotFound(_) => "not_found",
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for ControllerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ControllerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::TaskNotFound(_) => None,
        }
    }
}

impl From<RepoError> for ControllerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { id, .. } => Self::TaskNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ControllerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ControllerResult<T> = Result<T, ControllerError>;

/// Stateful coordinator between presentation and repositories.
pub struct ListController<T: TaskRepository, C: CategoryRepository> {
    tasks: T,
    categories: C,
    clock: Arc<dyn Clock>,
    query: ListQuery,
    working_set: Vec<Task>,
    category_list: Vec<Category>,
    view: TaskListView,
}

impl<T: TaskRepository, C: CategoryRepository> ListController<T, C> {
    pub fn new(tasks: T, categories: C) -> Self {
        Self {
            tasks,
            categories,
            clock: Arc::new(SystemClock),
            query: ListQuery::default(),
            working_set: Vec::new(),
            category_list: Vec::new(),
            view: TaskListView::default(),
        }
    }

    /// Replaces the time source used for `created_at` / `completed_at`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn view(&self) -> &TaskListView {
        &self.view
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Tasks from the last successful fetch, in scan order.
    pub fn working_set(&self) -> &[Task] {
        &self.working_set
    }

    /// Categories from the last successful category fetch.
    pub fn categories(&self) -> &[Category] {
        &self.category_list
    }

    /// Reloads the working set and republishes derived views.
    pub fn fetch(&mut self) -> ControllerResult<&TaskListView> {
        let started_at = Instant::now();
        self.view.loading = true;
        let fetched = self.tasks.list_all();
        self.view.loading = false;

        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(err) => return Err(fail("task_fetch", err.into())),
        };
        self.working_set = fetched.docs;
        self.recompute();
        info!(
            "event=task_fetch module=controller status=ok total={} pending={} completed={} duration_ms={}",
            self.working_set.len(),
            self.view.pending.len(),
            self.view.completed.len(),
            started_at.elapsed().as_millis()
        );
        Ok(&self.view)
    }

    /// Reloads the category list (sentinel first).
    pub fn fetch_categories(&mut self) -> ControllerResult<&[Category]> {
        match self.categories.list_all() {
            Ok(list) => {
                self.category_list = list.docs;
                debug!(
                    "event=category_fetch module=controller status=ok total={}",
                    self.category_list.len()
                );
                Ok(self.category_list.as_slice())
            }
            Err(err) => Err(fail("category_fetch", err.into())),
        }
    }

    /// Creates a pending task and refreshes views.
    ///
    /// A blank `category` files the task under the General category.
    pub fn add(&mut self, text: &str, category: &str) -> ControllerResult<Task> {
        if let Err(err) = validate_task_text(text) {
            return Err(fail("task_add", err.into()));
        }
        let category = match category.trim() {
            "" => GENERAL_CATEGORY_ID,
            trimmed => trimmed,
        };
        let task = Task::new(text.trim(), category, self.clock.now_epoch_ms());
        let created = self
            .tasks
            .insert(&task)
            .map_err(|err| fail("task_add", err.into()))?;
        info!(
            "event=task_add module=controller status=ok task_id={}",
            created.task_id
        );
        self.fetch()?;
        Ok(created)
    }

    /// Sets completion state, stamping or clearing `completed_at`.
    ///
    /// The task must be present in the current working set.
    pub fn toggle_completion(&mut self, id: &str, completed: bool) -> ControllerResult<Task> {
        let Some(current) = self.working_set.iter().find(|task| task.task_id == id) else {
            return Err(fail(
                "task_toggle",
                ControllerError::TaskNotFound(id.to_string()),
            ));
        };
        let mut task = current.clone();
        task.set_completed(completed, self.clock.now_epoch_ms());
        let updated = self
            .tasks
            .update(&task)
            .map_err(|err| fail("task_toggle", err.into()))?;
        info!(
            "event=task_toggle module=controller status=ok task_id={} completed={}",
            updated.task_id, updated.completed
        );
        self.fetch()?;
        Ok(updated)
    }

    /// Replaces text and category of a stored task (read-modify-write).
    ///
    /// `completed`, when given and different from the stored state, moves the
    /// task the same way [`Self::toggle_completion`] does.
    pub fn edit_task(
        &mut self,
        id: &str,
        text: &str,
        category: &str,
        completed: Option<bool>,
    ) -> ControllerResult<Task> {
        if let Err(err) = validate_task_text(text) {
            return Err(fail("task_edit", err.into()));
        }
        let mut task = self
            .tasks
            .get_by_id(id)
            .map_err(|err| fail("task_edit", err.into()))?;
        task.text = text.trim().to_string();
        task.category = match category.trim() {
            "" => GENERAL_CATEGORY_ID.to_string(),
            trimmed => trimmed.to_string(),
        };
        if let Some(completed) = completed.filter(|completed| *completed != task.completed) {
            task.set_completed(completed, self.clock.now_epoch_ms());
        }
        let updated = self
            .tasks
            .update(&task)
            .map_err(|err| fail("task_edit", err.into()))?;
        info!("event=task_edit module=controller status=ok task_id={id}");
        self.fetch()?;
        Ok(updated)
    }

    /// Deletes a task; absent identifiers are not an error.
    pub fn remove(&mut self, id: &str) -> ControllerResult<()> {
        self.tasks
            .delete(id)
            .map_err(|err| fail("task_remove", err.into()))?;
        info!("event=task_remove module=controller status=ok task_id={id}");
        self.fetch()?;
        Ok(())
    }

    pub fn set_search_query(&mut self, search_query: impl Into<String>) -> &TaskListView {
        self.query.search_query = search_query.into();
        self.recompute();
        &self.view
    }

    pub fn set_category_filter(&mut self, scope: CategoryScope) -> &TaskListView {
        self.query.category = scope;
        self.recompute();
        &self.view
    }

    pub fn set_sort(&mut self, sort: SortOrder) -> &TaskListView {
        self.query.sort = sort;
        self.recompute();
        &self.view
    }

    /// Resets search, category filter and sort, then refetches.
    pub fn clear_filters(&mut self) -> ControllerResult<&TaskListView> {
        self.query = ListQuery::default();
        self.fetch()
    }

    /// Resolves a task's category against the last category fetch.
    ///
    /// Identifiers win; older records that stored a display name resolve by
    /// exact name.
    pub fn category_label(&self, task: &Task) -> CategoryLabel {
        self.category_list
            .iter()
            .find(|category| category.category_id == task.category)
            .or_else(|| {
                self.category_list
                    .iter()
                    .find(|category| category.category_name == task.category)
            })
            .map_or(CategoryLabel::Uncategorized, |category| {
                CategoryLabel::Named(category.category_name.clone())
            })
    }

    fn recompute(&mut self) {
        let (pending, completed) = derive_view(&self.working_set, &self.query);
        self.view.pending = pending;
        self.view.completed = completed;
    }
}

/// Applies search, then category filter, then a stable sort, and splits the
/// result into `(pending, completed)` preserving that order.
pub fn derive_view(tasks: &[Task], query: &ListQuery) -> (Vec<Task>, Vec<Task>) {
    let needle = query.search_query.to_lowercase();
    let mut selected: Vec<Task> = tasks
        .iter()
        .filter(|task| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .filter(|task| query.category.admits(task))
        .cloned()
        .collect();
    selected.sort_by(|a, b| query.sort.compare(a, b));
    selected.into_iter().partition(|task| !task.completed)
}

fn fail(event: &str, err: ControllerError) -> ControllerError {
    warn!(
        "event={event} module=controller status=error error_code={}",
        err.error_code()
    );
    err
}
