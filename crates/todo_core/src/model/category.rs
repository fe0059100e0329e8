//! Category record and the reserved "General" sentinel.
//!
//! # Invariants
//! - The sentinel is synthesized at read time and never persisted.
//! - The sentinel cannot be renamed or deleted.

use super::{generate_id, ValidationError};
use serde::{Deserialize, Serialize};

/// Opaque category identifier.
pub type CategoryId = String;

/// Fixed identifier of the reserved category.
pub const GENERAL_CATEGORY_ID: &str = "general";
/// Display name of the reserved category.
pub const GENERAL_CATEGORY_NAME: &str = "General";

/// Persisted category record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub category_id: CategoryId,
    pub category_name: String,
}

impl Category {
    /// Creates a category with a generated identifier.
    pub fn new(category_name: impl Into<String>) -> Self {
        Self::with_id(generate_id(), category_name)
    }

    pub fn with_id(category_id: impl Into<CategoryId>, category_name: impl Into<String>) -> Self {
        Self {
            category_id: category_id.into(),
            category_name: category_name.into(),
        }
    }

    /// Returns the read-time sentinel.
    pub fn general() -> Self {
        Self::with_id(GENERAL_CATEGORY_ID, GENERAL_CATEGORY_NAME)
    }

    pub fn is_reserved(&self) -> bool {
        is_reserved_category_id(&self.category_id)
    }

    /// Case-insensitive name comparison after trimming.
    pub fn has_name(&self, name: &str) -> bool {
        self.category_name.trim().to_lowercase() == name.trim().to_lowercase()
    }

    /// Checks write-path requirements.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.category_id.trim().is_empty() {
            return Err(ValidationError::EmptyIdentifier("category_id"));
        }
        if self.category_name.trim().is_empty() {
            return Err(ValidationError::EmptyCategoryName);
        }
        Ok(())
    }
}

pub fn is_reserved_category_id(id: &str) -> bool {
    id == GENERAL_CATEGORY_ID
}
