//! Structural failures that abort a catalog run.
//!
//! Validation findings are not errors: they are returned as data by
//! [`validate_document`](crate::validator::validate_document). The variants here cover the cases
//! where continuing would produce a wrong index or hide a broken tree.

use std::path::Path;
use thiserror::Error;

/// Errors surfaced by the scanner and the index updater.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A file or directory could not be read or written.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error text.
        message: String,
    },
    /// The root index has no line matching the section marker.
    #[error("root index is missing the `{marker}` section")]
    MissingSection {
        /// Marker line that was searched for.
        marker: String,
    },
    /// The root index contains the section marker more than once.
    #[error("root index contains `{marker}` {count} times; expected exactly one")]
    DuplicateSection {
        /// Marker line that was searched for.
        marker: String,
        /// Number of matching lines.
        count: usize,
    },
}

impl CatalogError {
    /// Build an I/O error for `path`.
    pub fn io(path: &Path, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Convenience result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
