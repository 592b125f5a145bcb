use chrono::NaiveDate;
use scpe_shared::{PasswordError, ProjectId, UserId};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection, file access, lock timeout or any other SQLite failure
    /// that is not a constraint the caller can act on.
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("User {user_id} is already a member of project {project_id}")]
    AlreadyMember {
        project_id: ProjectId,
        user_id: UserId,
    },

    /// An insert referenced a user, project or task that does not exist.
    #[error("Referenced record does not exist")]
    UnknownReference,

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Message text must not be empty")]
    EmptyMessage,

    /// Any other input rejected before reaching SQLite.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Project deletion refused under [`OrphanPolicy::Restrict`](crate::OrphanPolicy::Restrict).
    #[error("Project {0} still has members, tasks or messages")]
    HasDependents(ProjectId),

    #[error("Operation requires the manager role")]
    Forbidden,

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Whether `err` is a UNIQUE or PRIMARY KEY violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// Map `QueryReturnedNoRows` to [`StoreError::NotFound`].
pub(crate) fn not_found(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Unavailable(other),
    }
}
