//! Persistence operations for the InMemory store
//!
//! This module handles serialization and file I/O for saving/loading
//! the in-memory store state to/from JSON files.

use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::RwLock;

use super::InMemory;
use crate::store::{Repository, StoreError, StoreResult, User};

/// The current persistence file format version.
/// v0 indicates this is an unstable format subject to breaking changes.
const PERSISTENCE_VERSION: u8 = 0;

fn is_v0(v: &u8) -> bool {
    *v == 0
}

/// Validates the persistence version during deserialization.
fn validate_persistence_version<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let version = u8::deserialize(deserializer)?;
    if version != PERSISTENCE_VERSION {
        return Err(serde::de::Error::custom(format!(
            "unsupported persistence version {version}; only version {PERSISTENCE_VERSION} is supported"
        )));
    }
    Ok(version)
}

/// On-disk layout of an InMemory store
#[derive(Serialize, Deserialize)]
struct SerializableStore {
    #[serde(
        rename = "_v",
        default,
        skip_serializing_if = "is_v0",
        deserialize_with = "validate_persistence_version"
    )]
    version: u8,
    #[serde(default)]
    users: BTreeMap<String, User>,
    #[serde(default)]
    repositories: BTreeMap<String, Repository>,
}

pub(crate) async fn save_to_file<P: AsRef<Path>>(store: &InMemory, path: P) -> StoreResult<()> {
    let serializable = SerializableStore {
        version: PERSISTENCE_VERSION,
        users: store.users.read().await.clone(),
        repositories: store.repositories.read().await.clone(),
    };

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|source| StoreError::SerializationFailed { source })?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| StoreError::FileIo { source })
}

pub(crate) async fn load_from_file<P: AsRef<Path>>(path: P) -> StoreResult<InMemory> {
    match tokio::fs::read_to_string(path).await {
        Ok(json) => {
            let serializable: SerializableStore = serde_json::from_str(&json)
                .map_err(|source| StoreError::DeserializationFailed { source })?;
            Ok(InMemory {
                users: RwLock::new(serializable.users),
                repositories: RwLock::new(serializable.repositories),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(InMemory::new()),
        Err(source) => Err(StoreError::FileIo { source }),
    }
}
