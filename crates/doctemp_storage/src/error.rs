//! Error types for temporary storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No entry is registered under the requested path.
    #[error("cannot open the file {path}")]
    NotFound {
        /// The path that was looked up.
        path: String,
    },

    /// The host file passed to `add` could not be read.
    #[error("cannot read source file {path}: {source}")]
    SourceRead {
        /// The host path that failed.
        path: String,
        /// The underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The random source failed while generating a name token.
    #[error("name generation failed: {0}")]
    NameGeneration(#[from] rand::Error),

    /// Every generated name collided with an existing entry.
    #[error("no free temp name after {attempts} attempts")]
    NameCollision {
        /// How many names were tried.
        attempts: u32,
    },

    /// An I/O error occurred in a disk-backed operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// Creates a not-found error for `path`.
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Creates a source-read error for `path`.
    pub fn source_read(path: impl Into<String>, source: io::Error) -> Self {
        Self::SourceRead {
            path: path.into(),
            source,
        }
    }

    /// Returns true if this is a [`StorageError::NotFound`].
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<StorageError> for io::Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => e,
            StorageError::SourceRead { source, .. } => source,
            StorageError::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            StorageError::NameCollision { .. } => {
                io::Error::new(io::ErrorKind::AlreadyExists, err)
            }
            StorageError::NameGeneration(_) => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}
