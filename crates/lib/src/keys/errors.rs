//! Error types for the `authorized_keys` synchronizer.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading or rewriting the `authorized_keys` file.
///
/// Whenever one of these is returned the file still holds its previous
/// contents; rewrites only become visible through an atomic rename.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuthorizedKeysError {
    /// Reading the current file failed.
    #[error("Failed to read authorized keys file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing or replacing the file failed.
    #[error("Failed to write authorized keys file {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The parent directory could not be created.
    #[error("Failed to create directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configured path has no parent directory or file name.
    #[error("Invalid authorized keys path: {path}")]
    InvalidPath { path: PathBuf },
}

impl AuthorizedKeysError {
    /// Path of the file or directory the failure refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            AuthorizedKeysError::Read { path, .. }
            | AuthorizedKeysError::Write { path, .. }
            | AuthorizedKeysError::CreateDir { path, .. }
            | AuthorizedKeysError::InvalidPath { path } => path,
        }
    }

    /// Check if this error comes from an underlying I/O failure.
    pub fn is_io_error(&self) -> bool {
        !matches!(self, AuthorizedKeysError::InvalidPath { .. })
    }
}

impl From<AuthorizedKeysError> for crate::Error {
    fn from(err: AuthorizedKeysError) -> Self {
        crate::Error::AuthorizedKeys(err)
    }
}
