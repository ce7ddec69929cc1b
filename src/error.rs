//! Error taxonomy for the record store. Every public operation fails with a
//! [`StoreError`], and every variant maps onto exactly one [`ErrorKind`] so a
//! front end can decide how to present it without matching on messages.

use std::fmt;
use std::path::PathBuf;

use rusqlite::ffi;
use thiserror::Error;

use crate::models::Entity;

/// Coarse classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    Reference,
    NotFound,
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Validation => "validation error",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Reference => "reference error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Storage => "storage error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} with id '{id}' already exists")]
    Conflict { entity: Entity, id: String },

    #[error("{entity} '{key}' does not exist")]
    Reference { entity: Entity, key: String },

    #[error("{entity} '{key}' matches {count} records")]
    AmbiguousReference {
        entity: Entity,
        key: String,
        count: usize,
    },

    #[error("{entity} with id '{id}' was not found")]
    NotFound { entity: Entity, id: String },

    #[error("{context}: {source}")]
    Storage {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to access {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(#[source] serde_json::Error),
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) | StoreError::MalformedSnapshot(_) => ErrorKind::Validation,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Reference { .. } | StoreError::AmbiguousReference { .. } => {
                ErrorKind::Reference
            }
            StoreError::NotFound { .. } => ErrorKind::NotFound,
            StoreError::Storage { .. } | StoreError::File { .. } => ErrorKind::Storage,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub(crate) fn not_found(entity: Entity, id: &str) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// `anyhow::Context`-style adapter that wraps engine errors with a short
/// description of the statement that failed.
pub(crate) trait StorageContext<T> {
    fn storage(self, context: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, context: &'static str) -> Result<T> {
        self.map_err(|source| StoreError::Storage { context, source })
    }
}

/// Which constraint an insert tripped, read from SQLite's extended result code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation {
    Duplicate,
    Dangling,
}

pub(crate) fn constraint_violation(err: &rusqlite::Error) -> Option<Violation> {
    let code = err.sqlite_error()?.extended_code;
    match code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
            Some(Violation::Duplicate)
        }
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Violation::Dangling),
        _ => None,
    }
}
