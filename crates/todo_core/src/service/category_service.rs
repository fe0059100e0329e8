//! Category management use-cases.
//!
//! # Responsibility
//! - Create, rename and delete categories with name rules applied.
//! - Present category lists with the "General" sentinel first.
//!
//! # Invariants
//! - Names are trimmed and unique case-insensitively, the sentinel included.
//! - The sentinel is rejected for rename/delete before any store request.
//! - Deleting a category leaves referencing tasks untouched.

use super::{repo_error_code, repo_notice_kind, NoticeKind};
use crate::model::category::{is_reserved_category_id, Category, CategoryId};
use crate::model::ValidationError;
use crate::repo::category_repo::CategoryRepository;
use crate::repo::RepoError;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum CategoryServiceError {
    Validation(ValidationError),
    /// Another category already uses this name (case-insensitive).
    DuplicateName(String),
    /// The sentinel category cannot be changed.
    Reserved(CategoryId),
    NotFound(CategoryId),
    Repo(RepoError),
}

impl CategoryServiceError {
    pub fn notice_kind(&self) -> NoticeKind {
        match self {
            Self::Validation(_) => NoticeKind::Inline,
            Self::DuplicateName(_) | Self::Reserved(_) | Self::NotFound(_) => {
                NoticeKind::Transient
            }
            Self::Repo(err) => repo_notice_kind(err),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateName(_) => "duplicate_name",
            Self::Reserved(_) => "reserved_category",
            Self::NotFound(_) => "not_found",
            Self::Repo(err) => repo_error_code(err),
        }
    }
}

impl Display for CategoryServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DuplicateName(name) => write!(f, "category already exists: `{name}`"),
            Self::Reserved(_) => write!(f, "the General category cannot be modified"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CategoryServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for CategoryServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { id, .. } => Self::NotFound(id),
            RepoError::ReservedCategory(id) => Self::Reserved(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for CategoryServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Category management facade.
pub struct CategoryService<R: CategoryRepository> {
    repo: R,
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// All categories, sentinel first, then scan order.
    pub fn list_categories(&self) -> Result<Vec<Category>, CategoryServiceError> {
        Ok(self.repo.list_all()?.docs)
    }

    /// Display names for selection lists.
    pub fn category_names(&self) -> Result<Vec<String>, CategoryServiceError> {
        Ok(self
            .list_categories()?
            .into_iter()
            .map(|category| category.category_name)
            .collect())
    }

    /// Creates a category with a fresh identifier.
    pub fn create_category(
        &self,
        name: impl Into<String>,
    ) -> Result<Category, CategoryServiceError> {
        let result = self.create_inner(name.into());
        log_outcome("category_create", &result);
        result
    }

    /// Renames an existing, non-reserved category.
    pub fn rename_category(
        &self,
        id: &str,
        name: impl Into<String>,
    ) -> Result<Category, CategoryServiceError> {
        let result = self.rename_inner(id, name.into());
        log_outcome("category_rename", &result);
        result
    }

    /// Deletes a category record. Absent identifiers are not an error.
    pub fn delete_category(&self, id: &str) -> Result<(), CategoryServiceError> {
        let result = if is_reserved_category_id(id) {
            Err(CategoryServiceError::Reserved(id.to_string()))
        } else {
            self.repo.delete(id).map_err(Into::into)
        };
        match &result {
            Ok(()) => info!("event=category_delete module=service status=ok category_id={id}"),
            Err(err) => warn!(
                "event=category_delete module=service status=error error_code={}",
                err.error_code()
            ),
        }
        result
    }

    fn create_inner(&self, name: String) -> Result<Category, CategoryServiceError> {
        let name = normalize_name(&name)?;
        self.ensure_name_available(&name, None)?;
        let category = Category::new(name);
        Ok(self.repo.insert(&category)?)
    }

    fn rename_inner(&self, id: &str, name: String) -> Result<Category, CategoryServiceError> {
        if is_reserved_category_id(id) {
            return Err(CategoryServiceError::Reserved(id.to_string()));
        }
        let name = normalize_name(&name)?;
        let mut category = self.repo.get_by_id(id)?;
        self.ensure_name_available(&name, Some(id))?;
        category.category_name = name;
        Ok(self.repo.update(&category)?)
    }

    fn ensure_name_available(
        &self,
        name: &str,
        except_id: Option<&str>,
    ) -> Result<(), CategoryServiceError> {
        let clash = self.repo.list_by(&|category| {
            category.has_name(name) && Some(category.category_id.as_str()) != except_id
        })?;
        if clash.total_docs > 0 {
            return Err(CategoryServiceError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyCategoryName);
    }
    Ok(trimmed.to_string())
}

fn log_outcome(event: &str, result: &Result<Category, CategoryServiceError>) {
    match result {
        Ok(category) => info!(
            "event={event} module=service status=ok category_id={}",
            category.category_id
        ),
        Err(err) => warn!(
            "event={event} module=service status=error error_code={}",
            err.error_code()
        ),
    }
}
