//! Task record.
//!
//! # Invariants
//! - `created_at` is set once at creation and never rewritten.
//! - `completed_at` is present only while `completed` is true.
//! - `category` is a loose reference; it may point at a deleted category.

use super::{generate_id, ValidationError};
use serde::{Deserialize, Serialize};

/// Opaque task identifier.
pub type TaskId = String;

/// Maximum task label length, in characters.
pub const MAX_TASK_TEXT_CHARS: usize = 100;

/// Persisted task record.
///
/// Field names match the stored record layout (`createdAt`, `completedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    pub text: String,
    /// Category identifier (or, in older records, display name).
    pub category: String,
    pub completed: bool,
    /// Unix epoch milliseconds.
    #[serde(rename = "createdAt")]
    pub created_at: i64,
    /// Unix epoch milliseconds; absent while pending.
    #[serde(
        rename = "completedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_at: Option<i64>,
}

impl Task {
    /// Creates a pending task with a generated identifier.
    pub fn new(text: impl Into<String>, category: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(generate_id(), text, category, created_at)
    }

    /// Creates a pending task with a caller-provided identifier.
    pub fn with_id(
        task_id: impl Into<TaskId>,
        text: impl Into<String>,
        category: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            text: text.into(),
            category: category.into(),
            completed: false,
            created_at,
            completed_at: None,
        }
    }

    /// Moves the task between pending and completed.
    ///
    /// Completing stamps `completed_at = now`; reopening clears it.
    pub fn set_completed(&mut self, completed: bool, now: i64) {
        self.completed = completed;
        self.completed_at = if completed { Some(now) } else { None };
    }

    /// Checks write-path requirements.
    ///
    /// The length cap is an input rule (see [`validate_task_text`]); stored
    /// records longer than it stay writable.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.task_id.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier("task_id"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyTaskText);
        }
        Ok(())
    }
}

/// Rejects blank labels and labels longer than [`MAX_TASK_TEXT_CHARS`].
///
/// Applied to newly entered text only.
pub fn validate_task_text(text: &str) -> Result<(), ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTaskText);
    }
    let len = trimmed.chars().count();
    if len > MAX_TASK_TEXT_CHARS {
        return Err(ValidationError::TaskTextTooLong {
            len,
            max: MAX_TASK_TEXT_CHARS,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_task_text, Task, MAX_TASK_TEXT_CHARS};
    use crate::model::ValidationError;

    #[test]
    fn set_completed_keeps_timestamp_in_step() {
        let mut task = Task::with_id("t1", "Buy milk", "general", 10);
        task.set_completed(true, 25);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(25));

        task.set_completed(false, 30);
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(task.created_at, 10);
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        assert_eq!(
            validate_task_text("   \t"),
            Err(ValidationError::EmptyTaskText)
        );
    }

    #[test]
    fn text_limit_counts_characters_not_bytes() {
        let at_limit = "é".repeat(MAX_TASK_TEXT_CHARS);
        assert!(validate_task_text(&at_limit).is_ok());

        let over = "x".repeat(MAX_TASK_TEXT_CHARS + 1);
        assert!(matches!(
            validate_task_text(&over),
            Err(ValidationError::TaskTextTooLong { len: 101, .. })
        ));
    }

    #[test]
    fn record_validation_ignores_the_input_length_cap() {
        let long = Task::with_id("t1", "x".repeat(MAX_TASK_TEXT_CHARS + 50), "general", 1);
        assert_eq!(long.validate(), Ok(()));

        let blank = Task::with_id("t2", "  ", "general", 1);
        assert_eq!(blank.validate(), Err(ValidationError::EmptyTaskText));
    }

    #[test]
    fn serialized_shape_uses_stored_field_names() {
        let mut task = Task::with_id("t1", "Buy milk", "home", 1_000);
        let pending = serde_json::to_value(&task).unwrap();
        assert_eq!(pending["createdAt"], 1_000);
        assert!(pending.get("completedAt").is_none());

        task.set_completed(true, 2_000);
        let done = serde_json::to_value(&task).unwrap();
        assert_eq!(done["completedAt"], 2_000);
        assert_eq!(done["task_id"], "t1");
    }
}
