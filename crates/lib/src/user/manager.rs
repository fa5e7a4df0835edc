//! User lifecycle: creation, removal and key management.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::{
    errors::UserError,
    validation::{validate_key_content, validate_key_names, validate_user_name},
};
use crate::{
    Result,
    access::revoke_access,
    keys::{AuthorizedKeys, AuthorizedKeysError, Key},
    store::{IdentityStore, StoreError, User},
};

/// Coordinates the identity store and the `authorized_keys` file.
///
/// The store is the source of truth. Every mutation commits to the store
/// first and then updates the file; if the file update fails the store
/// change stands and the caller receives
/// [`UserError::AuthorizedKeysOutOfSync`]. [`UserManager::rebuild_authorized_keys`]
/// regenerates the file from the store.
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn IdentityStore>,
    authorized_keys: AuthorizedKeys,
}

impl UserManager {
    pub fn new(store: Arc<dyn IdentityStore>, authorized_keys: AuthorizedKeys) -> Self {
        Self {
            store,
            authorized_keys,
        }
    }

    pub fn store(&self) -> &dyn IdentityStore {
        self.store.as_ref()
    }

    pub fn authorized_keys(&self) -> &AuthorizedKeys {
        &self.authorized_keys
    }

    /// Create a user with an initial set of keys.
    ///
    /// Nothing is written if the name is invalid, a key name repeats or a key
    /// spans several lines.
    pub async fn create_user(&self, name: &str, keys: Vec<Key>) -> Result<User> {
        validate_user_name(name)?;
        validate_key_names(name, &keys)?;
        validate_key_content(name, &keys)?;

        let user = User::new(name, keys);
        self.store
            .insert_user(user.clone())
            .await
            .map_err(|e| match e {
                StoreError::UserAlreadyExists { name } => {
                    UserError::UserAlreadyExists { username: name }.into()
                }
                other => crate::Error::from(other),
            })?;
        info!(user = %name, keys = user.keys.len(), "Created user");

        self.authorized_keys
            .add_keys(name, &user.keys)
            .await
            .map_err(|e| out_of_sync(name, "Creation", e))?;

        Ok(user)
    }

    /// Remove a user, revoking their access to shared repositories.
    ///
    /// Refuses when the user is the only grantee of any repository; in that
    /// case neither the user nor any repository is modified.
    pub async fn remove_user(&self, name: &str) -> Result<()> {
        match self.store.find_user(name).await {
            Ok(_) => {}
            Err(StoreError::UserNotFound { .. }) => {
                return Err(UserError::RemoveNotFound {
                    username: name.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(source) = revoke_access(self.store.as_ref(), name).await {
            if source.is_blocked() {
                warn!(
                    user = %name,
                    repositories = ?source.blocking_repositories(),
                    "Refusing to remove sole grantee"
                );
            }
            return Err(UserError::RemoveFailed {
                username: name.to_string(),
                source,
            }
            .into());
        }

        self.store.delete_user(name).await.map_err(|e| match e {
            StoreError::UserNotFound { name } => UserError::RemoveNotFound { username: name }.into(),
            other => crate::Error::from(other),
        })?;
        info!(user = %name, "Removed user");

        self.authorized_keys
            .remove_all_for_user(name)
            .await
            .map_err(|e| out_of_sync(name, "Removal", e))?;

        Ok(())
    }

    /// Add a key to an existing user.
    pub async fn add_key(&self, username: &str, key: Key) -> Result<()> {
        validate_key_content(username, std::slice::from_ref(&key))?;
        let mut user = self.get_user(username).await?;
        if user.key(&key.name).is_some() {
            return Err(UserError::KeyAlreadyExists {
                username: username.to_string(),
                key_name: key.name,
            }
            .into());
        }

        user.keys.push(key.clone());
        self.store
            .update_user_keys(username, user.keys)
            .await
            .map_err(|e| user_lookup_error(username, e))?;
        info!(user = %username, key = %key.name, "Added key");

        self.authorized_keys
            .add_line(username, &key)
            .await
            .map_err(|e| out_of_sync(username, "Key addition", e))?;

        Ok(())
    }

    /// Remove the key named `key_name` from a user.
    ///
    /// An unknown key name is an error rather than a no-op.
    pub async fn remove_key(&self, username: &str, key_name: &str) -> Result<()> {
        let mut user = self.get_user(username).await?;
        let Some(position) = user.keys.iter().position(|key| key.name == key_name) else {
            return Err(UserError::KeyNotFound {
                username: username.to_string(),
                key_name: key_name.to_string(),
            }
            .into());
        };

        user.keys.remove(position);
        self.store
            .update_user_keys(username, user.keys)
            .await
            .map_err(|e| user_lookup_error(username, e))?;
        info!(user = %username, key = %key_name, "Removed key");

        self.authorized_keys
            .remove_key(username, key_name)
            .await
            .map_err(|e| out_of_sync(username, "Key removal", e))?;

        Ok(())
    }

    pub async fn get_user(&self, username: &str) -> Result<User> {
        self.store
            .find_user(username)
            .await
            .map_err(|e| user_lookup_error(username, e))
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        Ok(self.store.list_users().await?)
    }

    /// Regenerate every managed `authorized_keys` line from the store.
    ///
    /// Returns the number of key lines written.
    pub async fn rebuild_authorized_keys(&self) -> Result<usize> {
        let users = self.store.list_users().await?;
        let count = users.iter().map(|user| user.keys.len()).sum();
        self.authorized_keys.rebuild(&users).await?;
        info!(
            users = users.len(),
            keys = count,
            path = %self.authorized_keys.path().display(),
            "Rebuilt authorized keys file"
        );
        Ok(count)
    }
}

fn user_lookup_error(username: &str, err: StoreError) -> crate::Error {
    match err {
        StoreError::UserNotFound { .. } => UserError::UserNotFound {
            username: username.to_string(),
        }
        .into(),
        other => other.into(),
    }
}

fn out_of_sync(username: &str, operation: &'static str, source: AuthorizedKeysError) -> crate::Error {
    error!(
        user = %username,
        operation,
        error = %source,
        "Authorized keys file diverged from the store"
    );
    UserError::AuthorizedKeysOutOfSync {
        username: username.to_string(),
        operation,
        source,
    }
    .into()
}
