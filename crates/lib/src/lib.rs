//!
//! Gatehouse: SSH identity management for git hosting.
//!
//! Gatehouse keeps two views of "who may log in and push" consistent: the
//! persisted users, keys and repository grants, and the `authorized_keys`
//! file sshd consults at login time.
//!
//! ## Core Concepts
//!
//! * **Stores (`store::IdentityStore`)**: Pluggable persistence for users and repositories.
//! * **Keys (`keys::Key`)**: Named SSH public keys owned by exactly one user.
//! * **AuthorizedKeys (`keys::AuthorizedKeys`)**: The derived `authorized_keys` file,
//!   rewritten atomically under a per-file lock.
//! * **Revocation (`access::RevocationPlan`)**: Two-phase removal of a user's
//!   repository grants that never leaves a repository without grantees.
//! * **UserManager (`user::UserManager`)**: Orchestrates user and key lifecycle
//!   across the store and the file.

pub mod access;
pub mod config;
pub mod keys;
pub mod store;
pub mod user;

pub use config::Config;
pub use keys::{AuthorizedKeys, Key, KeyId};
pub use store::{IdentityStore, Repository, User};
pub use user::UserManager;

/// Result type used throughout the Gatehouse library.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad category of an [`Error`].
///
/// Callers that need to react to failures (HTTP status codes, CLI exit codes)
/// should match on this rather than on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input was rejected; retrying unchanged will fail again.
    Validation,
    /// A referenced user, key or repository does not exist.
    NotFound,
    /// The change conflicts with current state (duplicates, sole grantee).
    Conflict,
    /// The store or the `authorized_keys` file failed; the operation may be retried.
    Persistence,
}

/// Common error type for the Gatehouse library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured store errors from the store module
    #[error(transparent)]
    Store(store::StoreError),

    /// Structured file errors from the keys module
    #[error(transparent)]
    AuthorizedKeys(keys::AuthorizedKeysError),

    /// Structured revocation errors from the access module
    #[error(transparent)]
    Access(access::AccessError),

    /// Structured user errors from the user module
    #[error(transparent)]
    User(user::UserError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Store(_) => "store",
            Error::AuthorizedKeys(_) => "keys",
            Error::Access(_) => "access",
            Error::User(_) => "user",
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Store(err) => store_kind(err),
            Error::AuthorizedKeys(_) => ErrorKind::Persistence,
            Error::Access(err) => access_kind(err),
            Error::User(err) => match err {
                user::UserError::RemoveFailed { source, .. } => access_kind(source),
                user::UserError::AuthorizedKeysOutOfSync { .. } => ErrorKind::Persistence,
                err if err.is_validation_error() => ErrorKind::Validation,
                err if err.is_not_found() => ErrorKind::NotFound,
                _ => ErrorKind::Conflict,
            },
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error is validation-related.
    pub fn is_validation_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Check if this error indicates a conflict with existing state.
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this error comes from the store or the file system.
    pub fn is_persistence_error(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }

    /// Check if the store was changed but the `authorized_keys` file was not.
    pub fn is_out_of_sync(&self) -> bool {
        matches!(
            self,
            Error::User(user::UserError::AuthorizedKeysOutOfSync { .. })
        )
    }
}

fn store_kind(err: &store::StoreError) -> ErrorKind {
    if err.is_not_found() {
        ErrorKind::NotFound
    } else if err.is_already_exists() {
        ErrorKind::Conflict
    } else {
        ErrorKind::Persistence
    }
}

fn access_kind(err: &access::AccessError) -> ErrorKind {
    match err {
        access::AccessError::SoleGrantee { .. } => ErrorKind::Conflict,
        access::AccessError::RevocationIncomplete { .. } => ErrorKind::Persistence,
        access::AccessError::Store(err) => store_kind(err),
    }
}
