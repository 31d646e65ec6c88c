//! Typed error definitions for jd_mover.
//! Provides the well-known failure modes of the move/rename engine for better logs and tests.
//!
//! Expected outcomes (a skipped move, a duplicate in a rename preview) are never
//! errors; they are values on the result types. Only exceptional conditions land here.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::fs_ops::describe_io_error;

#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Missing source file, unknown folder/drive, missing ledger record or undo entry.
    #[error("not found: {0}")]
    NotFound(String),

    /// A constructed destination resolved outside the configured base directory.
    #[error("security violation: {0}")]
    Security(String),

    /// No usable drive/base directory or an invalid configuration value.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Unique-name retry bound was hit.
    #[error("exhausted: {0}")]
    Exhausted(String),

    /// Rollback requested on a record that is not in the `moved` state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Reversal target is already occupied.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Rename options failed validation.
    #[error("invalid rename options: {0}")]
    InvalidOptions(String),

    /// OS-level move/copy/delete failure.
    #[error("{}", describe_io_error(.op, .path, .source))]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Ledger or undo-log persistence failure.
    #[error("store error: {0}")]
    Store(String),

    #[error("operation cancelled")]
    Cancelled,
}

impl OrganizeError {
    /// Stable numeric code for logs and process exit status.
    pub fn code(&self) -> i32 {
        match self {
            OrganizeError::NotFound(_) => 2,
            OrganizeError::Security(_) => 3,
            OrganizeError::Configuration(_) => 4,
            OrganizeError::Exhausted(_) => 5,
            OrganizeError::InvalidState(_) => 6,
            OrganizeError::Conflict(_) => 7,
            OrganizeError::InvalidOptions(_) => 8,
            OrganizeError::Io { .. } => 9,
            OrganizeError::Store(_) => 10,
            OrganizeError::Cancelled => 130,
        }
    }

    /// Short machine-readable kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            OrganizeError::NotFound(_) => "not_found",
            OrganizeError::Security(_) => "security",
            OrganizeError::Configuration(_) => "configuration",
            OrganizeError::Exhausted(_) => "exhausted",
            OrganizeError::InvalidState(_) => "invalid_state",
            OrganizeError::Conflict(_) => "conflict",
            OrganizeError::InvalidOptions(_) => "invalid_options",
            OrganizeError::Io { .. } => "io",
            OrganizeError::Store(_) => "store",
            OrganizeError::Cancelled => "cancelled",
        }
    }

    /// Build an `Io` error for `op` on `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        OrganizeError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_path(what: &str, path: &Path) -> Self {
        OrganizeError::NotFound(format!("{what} '{}'", path.display()))
    }
}

/// Adapter for `.map_err(...)`: wraps an io::Error with the operation and path.
pub(crate) fn io_err<'a>(
    op: &'static str,
    path: &'a Path,
) -> impl FnOnce(io::Error) -> OrganizeError + 'a {
    move |e| OrganizeError::io(op, path, e)
}

pub type Result<T, E = OrganizeError> = std::result::Result<T, E>;
