//! In-memory identity store.
//!
//! Suitable for tests, development, and small single-process deployments
//! where the whole state is saved to and loaded from a JSON file.

mod persistence;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IdentityStore, Repository, StoreError, StoreResult, User};
use crate::keys::Key;

/// An identity store that keeps every record in ordered maps.
///
/// Each map sits behind its own `RwLock`; a write to one user or repository
/// holds the corresponding write lock for the duration of the update, which
/// makes single-record updates atomic.
#[derive(Debug, Default)]
pub struct InMemory {
    pub(crate) users: RwLock<BTreeMap<String, User>>,
    pub(crate) repositories: RwLock<BTreeMap<String, Repository>>,
}

impl InMemory {
    /// Creates a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Saves all users and repositories to `path` as JSON.
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> StoreResult<()> {
        persistence::save_to_file(self, path).await
    }

    /// Loads a store from a JSON file written by [`InMemory::save_to_file`].
    ///
    /// If the file does not exist, a new, empty store is returned.
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        persistence::load_from_file(path).await
    }
}

#[async_trait]
impl IdentityStore for InMemory {
    async fn find_user(&self, name: &str) -> StoreResult<User> {
        let users = self.users.read().await;
        users.get(name).cloned().ok_or_else(|| StoreError::UserNotFound {
            name: name.to_string(),
        })
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.name) {
            return Err(StoreError::UserAlreadyExists { name: user.name });
        }
        users.insert(user.name.clone(), user);
        Ok(())
    }

    async fn update_user_keys(&self, name: &str, keys: Vec<Key>) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users.get_mut(name).ok_or_else(|| StoreError::UserNotFound {
            name: name.to_string(),
        })?;
        user.keys = keys;
        Ok(())
    }

    async fn delete_user(&self, name: &str) -> StoreResult<()> {
        let mut users = self.users.write().await;
        users
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::UserNotFound {
                name: name.to_string(),
            })
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }

    async fn insert_repository(&self, repository: Repository) -> StoreResult<()> {
        let mut repositories = self.repositories.write().await;
        if repositories.contains_key(&repository.name) {
            return Err(StoreError::RepositoryAlreadyExists {
                name: repository.name,
            });
        }
        repositories.insert(repository.name.clone(), repository);
        Ok(())
    }

    async fn find_repository(&self, name: &str) -> StoreResult<Repository> {
        let repositories = self.repositories.read().await;
        repositories
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::RepositoryNotFound {
                name: name.to_string(),
            })
    }

    async fn find_repositories_by_user(&self, user: &str) -> StoreResult<Vec<Repository>> {
        let repositories = self.repositories.read().await;
        Ok(repositories
            .values()
            .filter(|repository| repository.grants(user))
            .cloned()
            .collect())
    }

    async fn update_repository_users(&self, name: &str, users: Vec<String>) -> StoreResult<()> {
        let mut repositories = self.repositories.write().await;
        let repository =
            repositories
                .get_mut(name)
                .ok_or_else(|| StoreError::RepositoryNotFound {
                    name: name.to_string(),
                })?;
        repository.users = users;
        Ok(())
    }

    async fn delete_repository(&self, name: &str) -> StoreResult<()> {
        let mut repositories = self.repositories.write().await;
        repositories
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::RepositoryNotFound {
                name: name.to_string(),
            })
    }

    async fn list_repositories(&self) -> StoreResult<Vec<Repository>> {
        let repositories = self.repositories.read().await;
        Ok(repositories.values().cloned().collect())
    }
}
