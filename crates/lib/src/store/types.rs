//! Persisted records: users and repositories.

use serde::{Deserialize, Serialize};

use crate::keys::Key;

/// A user and the SSH keys they own.
///
/// `name` is the primary key. Keys are owned exclusively by this user and
/// their names are unique within `keys`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,

    #[serde(default)]
    pub keys: Vec<Key>,
}

impl User {
    pub fn new(name: impl Into<String>, keys: Vec<Key>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// Find a key by name.
    pub fn key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|key| key.name == name)
    }
}

/// A repository and the users granted access to it.
///
/// `users` holds user names (weak references); iteration order is stable and
/// mutations preserve the relative order of the remaining grantees.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,

    #[serde(default)]
    pub users: Vec<String>,
}

impl Repository {
    pub fn new<I, S>(name: impl Into<String>, users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            users: users.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `user` is one of this repository's grantees.
    pub fn grants(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }
}
