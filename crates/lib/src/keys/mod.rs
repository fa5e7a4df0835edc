//! SSH public keys and their `authorized_keys` materialization.
//!
//! A [`Key`] is owned by exactly one user. Every key is rendered into one
//! `authorized_keys` line by the [`encoder`], tagged with a [`KeyId`] so the
//! [`AuthorizedKeys`] synchronizer can later find and replace or drop it.

pub mod authorized_keys;
pub mod encoder;
pub mod errors;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use authorized_keys::AuthorizedKeys;
pub use errors::AuthorizedKeysError;

/// A named SSH public key.
///
/// `content` is the raw public key material plus an optional comment
/// (e.g. `ssh-ed25519 AAAA... alice@laptop`). It is not parsed or validated.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    /// Label chosen by the owner, unique within the owner's key set
    pub name: String,

    /// Public key material, passed through to the encoder verbatim
    pub content: String,
}

impl Key {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Identity of a key within the `authorized_keys` file: owner plus key name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyId {
    pub user: String,
    pub key: String,
}

impl KeyId {
    pub fn new(user: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user, self.key)
    }
}
