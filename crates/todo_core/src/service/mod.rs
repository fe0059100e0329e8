//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Return explicit outcomes; presentation decides how to notify.
//!
//! # See also
//! - [`NoticeKind`] for how each failure should surface to a user.

use crate::db::DbError;
use crate::repo::RepoError;

pub mod category_service;
pub mod clock;
pub mod list_controller;

/// How a failed action should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Block the action and show the message next to the input.
    Inline,
    /// Short-lived notification; the session continues normally.
    Transient,
    /// Storage is gone; degrade the feature to a disabled state.
    Blocking,
    /// Programming error that should never reach an end user.
    Defect,
}

pub(crate) fn repo_notice_kind(err: &RepoError) -> NoticeKind {
    match err {
        RepoError::Validation(_) => NoticeKind::Inline,
        RepoError::NotFound { .. }
        | RepoError::DuplicateKey { .. }
        | RepoError::ReservedCategory(_)
        | RepoError::InvalidData(_) => NoticeKind::Transient,
        RepoError::Db(db) => match db {
            DbError::StoreUnavailable(_)
            | DbError::UnsupportedSchemaVersion { .. }
            | DbError::LockPoisoned(_) => NoticeKind::Blocking,
            DbError::NotOpen | DbError::UnknownCollection(_) | DbError::MissingKey { .. } => {
                NoticeKind::Defect
            }
            DbError::KeyExists { .. } | DbError::CorruptRecord { .. } | DbError::Sqlite(_) => {
                NoticeKind::Transient
            }
        },
    }
}

/// Stable metadata-only code for log lines.
pub(crate) fn repo_error_code(err: &RepoError) -> &'static str {
    match err {
        RepoError::Validation(_) => "validation",
        RepoError::NotFound { .. } => "not_found",
        RepoError::DuplicateKey { .. } => "duplicate_key",
        RepoError::ReservedCategory(_) => "reserved_category",
        RepoError::InvalidData(_) => "invalid_data",
        RepoError::Db(DbError::StoreUnavailable(_)) => "store_unavailable",
        RepoError::Db(DbError::NotOpen) => "not_open",
        RepoError::Db(_) => "db_error",
    }
}

#[cfg(test)]
mod tests {
    use super::{repo_error_code, repo_notice_kind, NoticeKind};
    use crate::db::{Collection, DbError};
    use crate::model::ValidationError;
    use crate::repo::RepoError;

    #[test]
    fn notice_policy_follows_error_class() {
        assert_eq!(
            repo_notice_kind(&RepoError::Validation(ValidationError::EmptyTaskText)),
            NoticeKind::Inline
        );
        assert_eq!(
            repo_notice_kind(&RepoError::NotFound {
                collection: Collection::Tasks,
                id: "t1".to_string(),
            }),
            NoticeKind::Transient
        );
        assert_eq!(
            repo_notice_kind(&RepoError::Db(DbError::StoreUnavailable(
                "denied".to_string()
            ))),
            NoticeKind::Blocking
        );
        assert_eq!(
            repo_notice_kind(&RepoError::Db(DbError::NotOpen)),
            NoticeKind::Defect
        );
    }

    #[test]
    fn store_unavailable_has_its_own_code() {
        let err = RepoError::Db(DbError::StoreUnavailable("quota".to_string()));
        assert_eq!(repo_error_code(&err), "store_unavailable");
    }
}
