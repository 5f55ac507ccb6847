pub mod sqlite;
pub mod repository;

pub use sqlite::*;
pub use repository::*;

use rusqlite::ffi;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid {entity_type} id: {value}")]
    InvalidId { entity_type: String, value: i64 },

    #[error("{entity_type} {id} is still referenced: {reason}")]
    Conflict {
        entity_type: String,
        id: String,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),
}

/// Coarse classification used at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Storage,
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } | Self::ConstraintViolation(_) => ErrorKind::Conflict,
            Self::Sqlite(_) | Self::Io(_) | Self::MigrationFailed { .. } => ErrorKind::Storage,
        }
    }

    pub(crate) fn not_found(entity_type: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }
}

/// True when SQLite rejected a statement because of a FOREIGN KEY constraint.
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// True for UNIQUE / PRIMARY KEY violations.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// True when the clash is on the primary key specifically.
pub(crate) fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

/// Map a write failure, turning UNIQUE/PRIMARY KEY violations into
/// `ConstraintViolation` so callers can tell them apart from I/O trouble.
pub(crate) fn map_write_error(err: rusqlite::Error, what: &str) -> DatabaseError {
    if is_unique_violation(&err) {
        DatabaseError::ConstraintViolation(format!("{what}: {err}"))
    } else {
        DatabaseError::Sqlite(err)
    }
}
