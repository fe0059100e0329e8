//! Domain records for tasks and categories.
//!
//! # Responsibility
//! - Define the persisted record shapes shared by repositories and services.
//! - Own field-level validation rules that every write path must honor.
//!
//! # Invariants
//! - Identifiers are generated client-side before insertion; the store never
//!   assigns them.
//! - `completed_at` is set if and only if `completed` is true. The controller
//!   keeps this consistent; storage does not enforce it.

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod category;
pub mod task;

/// Generates a fresh random record identifier.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Field-level validation failures for task and category records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Task text is blank after trimming.
    EmptyTaskText,
    /// Task text exceeds the label limit.
    TaskTextTooLong { len: usize, max: usize },
    /// Category name is blank after trimming.
    EmptyCategoryName,
    /// Primary key field is blank.
    EmptyIdentifier(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTaskText => write!(f, "task text must not be blank"),
            Self::TaskTextTooLong { len, max } => {
                write!(f, "task text has {len} characters; limit is {max}")
            }
            Self::EmptyCategoryName => write!(f, "category name must not be blank"),
            Self::EmptyIdentifier(field) => write!(f, "`{field}` must not be blank"),
        }
    }
}

impl Error for ValidationError {}
