//! Identity stores: persisted users, keys and repository grants.
//!
//! The [`IdentityStore`] trait is the boundary between the access logic and
//! whatever holds the records. Each method is atomic for the single record it
//! touches; no method spans more than one user or repository, and callers
//! must not assume cross-record transactions.
//!
//! Two implementations ship with the crate:
//!
//! * [`InMemory`]: ordered maps behind async locks, with JSON file persistence.
//! * [`Sqlite`] (feature `sqlite`): a sqlx-backed relational store.

pub mod errors;
pub mod in_memory;
#[cfg(feature = "sqlite")]
pub mod sql;
pub mod types;

use async_trait::async_trait;

pub use errors::StoreError;
pub use in_memory::InMemory;
#[cfg(feature = "sqlite")]
pub use sql::Sqlite;
pub use types::{Repository, User};

use crate::keys::Key;

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Storage of users and repositories.
///
/// All implementations must be `Send` and `Sync` so a single store can be
/// shared by concurrent operations.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Retrieve a user by name.
    ///
    /// Returns `StoreError::UserNotFound` if no such user exists.
    async fn find_user(&self, name: &str) -> StoreResult<User>;

    /// Insert a new user.
    ///
    /// Returns `StoreError::UserAlreadyExists` if the name is taken.
    async fn insert_user(&self, user: User) -> StoreResult<()>;

    /// Replace the key list of an existing user.
    async fn update_user_keys(&self, name: &str, keys: Vec<Key>) -> StoreResult<()>;

    /// Delete a user record. Repositories referencing the user are not touched.
    async fn delete_user(&self, name: &str) -> StoreResult<()>;

    /// All users, ordered by name.
    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Insert a new repository.
    ///
    /// Returns `StoreError::RepositoryAlreadyExists` if the name is taken.
    async fn insert_repository(&self, repository: Repository) -> StoreResult<()>;

    /// Retrieve a repository by name.
    async fn find_repository(&self, name: &str) -> StoreResult<Repository>;

    /// All repositories whose grantees include `user`, ordered by name.
    async fn find_repositories_by_user(&self, user: &str) -> StoreResult<Vec<Repository>>;

    /// Replace the grantee list of an existing repository.
    async fn update_repository_users(&self, name: &str, users: Vec<String>) -> StoreResult<()>;

    /// Delete a repository record.
    async fn delete_repository(&self, name: &str) -> StoreResult<()>;

    /// All repositories, ordered by name.
    async fn list_repositories(&self) -> StoreResult<Vec<Repository>>;
}
