//! Error types for identity stores.

use thiserror::Error;

/// Errors that can occur while reading or writing users and repositories.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// User not found by name.
    #[error("User not found: {name}")]
    UserNotFound { name: String },

    /// A user with this name already exists.
    #[error("User already exists: {name}")]
    UserAlreadyExists { name: String },

    /// Repository not found by name.
    #[error("Repository not found: {name}")]
    RepositoryNotFound { name: String },

    /// A repository with this name already exists.
    #[error("Repository already exists: {name}")]
    RepositoryAlreadyExists { name: String },

    /// Serialization failed.
    #[error("Serialization failed")]
    SerializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// Deserialization failed.
    #[error("Deserialization failed")]
    DeserializationFailed {
        #[source]
        source: serde_json::Error,
    },

    /// File I/O error.
    #[error("File I/O error")]
    FileIo {
        #[source]
        source: std::io::Error,
    },

    /// SQL query or connection failure.
    #[cfg(feature = "sqlite")]
    #[error("SQL error: {reason}")]
    SqlxError {
        reason: String,
        #[source]
        source: Option<sqlx::Error>,
    },
}

impl StoreError {
    /// Check if this error indicates a record was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound { .. } | StoreError::RepositoryNotFound { .. }
        )
    }

    /// Check if this error indicates a record already exists.
    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            StoreError::UserAlreadyExists { .. } | StoreError::RepositoryAlreadyExists { .. }
        )
    }

    /// Check if this error comes from the storage medium rather than the data.
    pub fn is_storage_error(&self) -> bool {
        !self.is_not_found() && !self.is_already_exists()
    }
}

impl From<StoreError> for crate::Error {
    fn from(err: StoreError) -> Self {
        crate::Error::Store(err)
    }
}
