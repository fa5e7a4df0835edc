//! Error types for the user system
//!
//! Display strings are what callers (CLI, HTTP handlers) show verbatim, so
//! their wording is kept stable.

use thiserror::Error;

use crate::{access::AccessError, keys::AuthorizedKeysError};

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UserError {
    #[error("Validation Error: user name is not valid")]
    InvalidName { name: String },

    #[error("Validation Error: key name \"{key_name}\" is used more than once")]
    DuplicateKeyName { username: String, key_name: String },

    #[error("Validation Error: key \"{key_name}\" must be a single line")]
    InvalidKeyContent { username: String, key_name: String },

    #[error("User \"{username}\" not found")]
    UserNotFound { username: String },

    #[error("User \"{username}\" already exists")]
    UserAlreadyExists { username: String },

    #[error("Key \"{key_name}\" not found for user \"{username}\"")]
    KeyNotFound { username: String, key_name: String },

    #[error("Key \"{key_name}\" already exists for user \"{username}\"")]
    KeyAlreadyExists { username: String, key_name: String },

    #[error("Could not remove user: not found")]
    RemoveNotFound { username: String },

    #[error("Could not remove user: {source}")]
    RemoveFailed {
        username: String,
        #[source]
        source: AccessError,
    },

    /// The store was updated but the `authorized_keys` file was not.
    ///
    /// The store change stands; rebuilding the file repairs the divergence.
    #[error("{operation} for user \"{username}\" was saved but the authorized keys file was not updated")]
    AuthorizedKeysOutOfSync {
        username: String,
        operation: &'static str,
        #[source]
        source: AuthorizedKeysError,
    },
}

impl UserError {
    /// Check if this error indicates a user or key was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            UserError::UserNotFound { .. }
                | UserError::KeyNotFound { .. }
                | UserError::RemoveNotFound { .. }
        )
    }

    /// Check if this error was caused by invalid input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            UserError::InvalidName { .. }
                | UserError::DuplicateKeyName { .. }
                | UserError::InvalidKeyContent { .. }
        )
    }

    /// Check if the requested change conflicts with existing state.
    pub fn is_conflict(&self) -> bool {
        match self {
            UserError::UserAlreadyExists { .. } | UserError::KeyAlreadyExists { .. } => true,
            UserError::RemoveFailed { source, .. } => source.is_blocked(),
            _ => false,
        }
    }

    /// Name of the user the failed operation was about.
    pub fn username(&self) -> &str {
        match self {
            UserError::InvalidName { name } => name,
            UserError::DuplicateKeyName { username, .. }
            | UserError::InvalidKeyContent { username, .. }
            | UserError::UserNotFound { username }
            | UserError::UserAlreadyExists { username }
            | UserError::KeyNotFound { username, .. }
            | UserError::KeyAlreadyExists { username, .. }
            | UserError::RemoveNotFound { username }
            | UserError::RemoveFailed { username, .. }
            | UserError::AuthorizedKeysOutOfSync { username, .. } => username,
        }
    }
}

impl From<UserError> for crate::Error {
    fn from(err: UserError) -> Self {
        crate::Error::User(err)
    }
}
