use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use todo_core::db::{MemoryRecordStore, Record};
use todo_core::{
    Category, CategoryLabel, CategoryRepository, CategoryScope, Clock, Collection,
    ControllerError, DbError, DbResult, ListController, NoticeKind, RecordStore, SortDirection,
    SortOrder, StoreCategoryRepository, StoreConnector, StoreTaskRepository, Task,
    TaskRepository, ValidationError, GENERAL_CATEGORY_ID,
};

/// Returns 1000, 2000, 3000, ... on successive calls.
struct StepClock(AtomicI64);

impl StepClock {
    fn new() -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(0)))
    }
}

impl Clock for StepClock {
    fn now_epoch_ms(&self) -> i64 {
        self.0.fetch_add(1_000, Ordering::SeqCst) + 1_000
    }
}

type Controller = ListController<StoreTaskRepository, StoreCategoryRepository>;

fn setup_with(
    connector: StoreConnector,
) -> (Controller, StoreTaskRepository, StoreCategoryRepository) {
    let connector = Arc::new(connector);
    let tasks = StoreTaskRepository::new(Arc::clone(&connector));
    let categories = StoreCategoryRepository::new(connector);
    let controller =
        ListController::new(tasks.clone(), categories.clone()).with_clock(StepClock::new());
    (controller, tasks, categories)
}

fn setup() -> (Controller, StoreTaskRepository, StoreCategoryRepository) {
    setup_with(StoreConnector::in_memory())
}

fn ids(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.task_id.as_str()).collect()
}

#[test]
fn add_rejects_blank_text_without_persisting() {
    let (mut controller, tasks, _) = setup();
    for text in ["", "   ", "\n\t"] {
        let err = controller.add(text, "work").unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Validation(ValidationError::EmptyTaskText)
        ));
        assert_eq!(err.notice_kind(), NoticeKind::Inline);
    }
    assert_eq!(tasks.list_all().unwrap().total_docs, 0);
}

#[test]
fn add_persists_pending_task_and_refreshes() {
    let (mut controller, tasks, _) = setup();
    let created = controller.add("  Buy Milk ", "").unwrap();

    assert_eq!(created.text, "Buy Milk");
    assert_eq!(created.category, GENERAL_CATEGORY_ID);
    assert!(!created.completed);
    assert_eq!(created.completed_at, None);
    assert_eq!(created.created_at, 1_000);
    assert!(!created.task_id.is_empty());

    assert_eq!(tasks.get_by_id(&created.task_id).unwrap(), created);
    assert_eq!(controller.view().pending, vec![created]);
    assert!(controller.view().completed.is_empty());
    assert!(!controller.view().loading);
}

#[test]
fn toggle_keeps_completed_and_timestamp_in_step() {
    let (mut controller, tasks, _) = setup();
    let created = controller.add("Write report", "work").unwrap();

    let done = controller.toggle_completion(&created.task_id, true).unwrap();
    assert!(done.completed);
    assert!(done.completed_at.is_some());
    assert_eq!(done.created_at, created.created_at);
    assert_eq!(tasks.get_by_id(&created.task_id).unwrap(), done);
    assert!(controller.view().pending.is_empty());
    assert_eq!(ids(&controller.view().completed), [created.task_id.as_str()]);

    let reopened = controller
        .toggle_completion(&created.task_id, false)
        .unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, None);
    assert_eq!(ids(&controller.view().pending), [created.task_id.as_str()]);
}

#[test]
fn toggle_requires_task_in_working_set() {
    let (mut controller, tasks, _) = setup();
    // Stored behind the controller's back; not fetched yet.
    tasks
        .insert(&Task::with_id("late", "Late arrival", "general", 1))
        .unwrap();

    let err = controller.toggle_completion("late", true).unwrap_err();
    assert!(matches!(err, ControllerError::TaskNotFound(ref id) if id == "late"));
    assert_eq!(err.notice_kind(), NoticeKind::Transient);
    assert!(!tasks.get_by_id("late").unwrap().completed);

    controller.fetch().unwrap();
    controller.toggle_completion("late", true).unwrap();
}

#[test]
fn sort_scenario_orders_by_creation_time() {
    let (mut controller, tasks, _) = setup();
    let a = Task::with_id("b-id", "A", "work", 100);
    let b = Task::with_id("a-id", "B", "home", 200);
    tasks.insert(&a).unwrap();
    tasks.insert(&b).unwrap();
    controller.fetch().unwrap();

    controller.set_sort(SortOrder::created_at(SortDirection::Ascending));
    assert_eq!(controller.view().pending, vec![a.clone(), b.clone()]);

    controller.set_sort(SortOrder::created_at(SortDirection::Descending));
    assert_eq!(controller.view().pending, vec![b, a]);
}

#[test]
fn ascending_and_descending_are_reverses_for_distinct_timestamps() {
    let (mut controller, _, _) = setup();
    for text in ["one", "two", "three", "four"] {
        controller.add(text, "general").unwrap();
    }

    let asc = controller
        .set_sort(SortOrder::created_at(SortDirection::Ascending))
        .pending
        .clone();
    let mut desc = controller
        .set_sort(SortOrder::created_at(SortDirection::Descending))
        .pending
        .clone();
    desc.reverse();
    assert_eq!(asc, desc);
    assert_eq!(asc.len(), 4);
}

#[test]
fn search_and_category_filters_combine() {
    let (mut controller, tasks, _) = setup();
    tasks
        .insert(&Task::with_id("t1", "Buy Milk", "home", 1))
        .unwrap();
    tasks
        .insert(&Task::with_id("t2", "Buy paint", "work", 2))
        .unwrap();
    tasks
        .insert(&Task::with_id("t3", "Call mom", "home", 3))
        .unwrap();
    controller.fetch().unwrap();

    for needle in ["milk", "MILK", "buy m"] {
        let view = controller.set_search_query(needle);
        assert_eq!(ids(&view.pending), ["t1"], "query {needle:?}");
    }

    controller.set_search_query("buy");
    let view = controller.set_category_filter(CategoryScope::from_choice("work"));
    assert_eq!(ids(&view.pending), ["t2"]);

    let view = controller.set_category_filter(CategoryScope::from_choice("All"));
    assert_eq!(view.pending.len(), 2);
}

#[test]
fn clear_filters_restores_defaults_and_refetches() {
    let (mut controller, tasks, _) = setup();
    controller.add("keep", "home").unwrap();
    controller.set_search_query("nothing matches this");
    controller.set_category_filter(CategoryScope::Category("work".to_string()));
    assert!(controller.view().pending.is_empty());

    tasks
        .insert(&Task::with_id("zz", "added elsewhere", "general", 1))
        .unwrap();
    let view = controller.clear_filters().unwrap();
    assert_eq!(view.pending.len(), 2);
    assert_eq!(controller.query(), &todo_core::ListQuery::default());
}

#[test]
fn remove_is_idempotent_and_refreshes() {
    let (mut controller, _, _) = setup();
    let created = controller.add("temporary", "general").unwrap();
    controller.remove(&created.task_id).unwrap();
    controller.remove(&created.task_id).unwrap();
    assert!(controller.view().pending.is_empty());
    assert!(controller.working_set().is_empty());
}

#[test]
fn edit_replaces_text_and_category() {
    let (mut controller, tasks, _) = setup();
    let created = controller.add("draft", "home").unwrap();

    let edited = controller
        .edit_task(&created.task_id, "final", "work", None)
        .unwrap();
    assert_eq!(edited.text, "final");
    assert_eq!(edited.category, "work");
    assert_eq!(edited.created_at, created.created_at);
    assert_eq!(tasks.get_by_id(&created.task_id).unwrap(), edited);

    assert!(matches!(
        controller.edit_task(&created.task_id, " ", "work", None),
        Err(ControllerError::Validation(_))
    ));
    assert!(matches!(
        controller.edit_task("missing", "text", "work", None),
        Err(ControllerError::TaskNotFound(_))
    ));
}

#[test]
fn edit_can_change_completion_state() {
    let (mut controller, _, _) = setup();
    let created = controller.add("draft", "home").unwrap();

    let done = controller
        .edit_task(&created.task_id, "draft", "home", Some(true))
        .unwrap();
    assert!(done.completed);
    let stamped = done.completed_at.unwrap();
    assert_eq!(ids(&controller.view().completed), [created.task_id.as_str()]);

    let unchanged = controller
        .edit_task(&created.task_id, "renamed", "home", Some(true))
        .unwrap();
    assert_eq!(unchanged.completed_at, Some(stamped));

    let reopened = controller
        .edit_task(&created.task_id, "renamed", "home", Some(false))
        .unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.completed_at, None);
}

#[test]
fn stored_text_over_input_limit_stays_editable() {
    let (mut controller, tasks, _) = setup();
    let long_text = "x".repeat(150);
    tasks
        .insert(&Task::with_id("t-long", long_text.as_str(), "general", 5))
        .unwrap();
    controller.fetch().unwrap();
    assert_eq!(ids(&controller.view().pending), ["t-long"]);

    let done = controller.toggle_completion("t-long", true).unwrap();
    assert!(done.completed);
    assert_eq!(done.text, long_text);
    assert_eq!(ids(&controller.view().completed), ["t-long"]);

    let reopened = controller.toggle_completion("t-long", false).unwrap();
    assert!(!reopened.completed);

    // New input is still capped.
    assert!(matches!(
        controller.add(&"y".repeat(101), "general"),
        Err(ControllerError::Validation(ValidationError::TaskTextTooLong { len: 101, .. }))
    ));
}

#[test]
fn category_stored_as_display_name_resolves_to_label() {
    let (mut controller, _, categories) = setup();
    categories.insert(&Category::with_id("c1", "Work")).unwrap();
    let by_name = controller.add("Ship", "Work").unwrap();
    let wrong_case = controller.add("Ship later", "work").unwrap();

    controller.fetch_categories().unwrap();
    assert_eq!(
        controller.category_label(&by_name),
        CategoryLabel::Named("Work".to_string())
    );
    assert_eq!(
        controller.category_label(&wrong_case),
        CategoryLabel::Uncategorized
    );
}

#[test]
fn deleted_category_falls_back_to_uncategorized() {
    let (mut controller, _, categories) = setup();
    categories
        .insert(&Category::with_id("c-work", "Work"))
        .unwrap();
    let task = controller.add("Ship it", "c-work").unwrap();
    let general_task = controller.add("Misc", "").unwrap();

    controller.fetch_categories().unwrap();
    assert_eq!(
        controller.category_label(&task),
        CategoryLabel::Named("Work".to_string())
    );
    assert_eq!(
        controller.category_label(&general_task),
        CategoryLabel::Named("General".to_string())
    );

    categories.delete("c-work").unwrap();
    controller.fetch_categories().unwrap();
    controller.fetch().unwrap();
    let kept = &controller.view().pending;
    assert!(kept.iter().any(|t| t.task_id == task.task_id && t.category == "c-work"));
    assert_eq!(controller.category_label(&task), CategoryLabel::Uncategorized);
}

/// Memory engine whose scans can be switched to fail.
struct FlakyStore {
    inner: MemoryRecordStore,
    fail_scans: AtomicBool,
}

impl RecordStore for FlakyStore {
    fn engine(&self) -> &'static str {
        "flaky"
    }

    fn schema_version(&self) -> DbResult<u32> {
        self.inner.schema_version()
    }

    fn get(&self, collection: Collection, key: &str) -> DbResult<Option<Record>> {
        self.inner.get(collection, key)
    }

    fn get_all(&self, collection: Collection) -> DbResult<Vec<Record>> {
        if self.fail_scans.load(Ordering::SeqCst) {
            return Err(DbError::StoreUnavailable("quota exceeded".to_string()));
        }
        self.inner.get_all(collection)
    }

    fn add(&self, collection: Collection, record: Record) -> DbResult<()> {
        self.inner.add(collection, record)
    }

    fn put(&self, collection: Collection, record: Record) -> DbResult<()> {
        self.inner.put(collection, record)
    }

    fn delete(&self, collection: Collection, key: &str) -> DbResult<()> {
        self.inner.delete(collection, key)
    }
}

#[test]
fn failed_fetch_leaves_state_unchanged() {
    let store = Arc::new(FlakyStore {
        inner: MemoryRecordStore::new(),
        fail_scans: AtomicBool::new(false),
    });
    let record = json!({
        "task_id": "t1",
        "text": "stable",
        "category": "general",
        "completed": false,
        "createdAt": 5
    });
    store
        .add(Collection::Tasks, record.as_object().cloned().unwrap())
        .unwrap();
    let (mut controller, _, _) = setup_with(StoreConnector::with_store(store.clone()));
    controller.fetch().unwrap();
    let before = controller.view().clone();

    store.fail_scans.store(true, Ordering::SeqCst);
    let err = controller.fetch().unwrap_err();
    assert_eq!(err.notice_kind(), NoticeKind::Blocking);
    assert_eq!(controller.view(), &before);
    assert_eq!(ids(controller.working_set()), ["t1"]);
    assert!(!controller.view().loading);
}
