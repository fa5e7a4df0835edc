//! Store creation and the wiring of a `UserManager`.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use gatehouse::{
    AuthorizedKeys, Config, IdentityStore, UserManager, config::default_authorized_keys_path,
    store::InMemory,
};

use crate::cli::{Backend, GlobalArgs};

const SQLITE_FILE: &str = "gatehouse.db";
const JSON_FILE: &str = "gatehouse.json";

/// An opened store together with what it takes to persist it.
pub struct OpenStore {
    store: Arc<dyn IdentityStore>,
    /// Set for the in-memory backend, which must be saved explicitly
    snapshot: Option<(Arc<InMemory>, PathBuf)>,
}

impl OpenStore {
    pub fn store(&self) -> Arc<dyn IdentityStore> {
        self.store.clone()
    }

    /// Flush changes made through the store. A no-op for SQLite.
    pub async fn persist(&self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some((store, path)) = &self.snapshot {
            store.save_to_file(path).await?;
            tracing::debug!("Saved store to {}", path.display());
        }
        Ok(())
    }
}

/// Create the appropriate store based on configuration
pub async fn open_store(args: &GlobalArgs) -> Result<OpenStore, Box<dyn std::error::Error>> {
    let data_dir = args.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir).await?;

    match args.backend {
        Backend::Sqlite => open_sqlite(&data_dir.join(SQLITE_FILE)).await,
        Backend::Inmemory => {
            let json_path = data_dir.join(JSON_FILE);
            tracing::debug!(
                "Using in-memory store with persistence at {}",
                json_path.display()
            );
            let store = Arc::new(InMemory::load_from_file(&json_path).await?);
            Ok(OpenStore {
                store: store.clone(),
                snapshot: Some((store, json_path)),
            })
        }
    }
}

#[cfg(feature = "sqlite")]
async fn open_sqlite(path: &Path) -> Result<OpenStore, Box<dyn std::error::Error>> {
    tracing::debug!("Using SQLite store at {}", path.display());
    let store = gatehouse::store::Sqlite::open(path).await?;
    Ok(OpenStore {
        store: Arc::new(store),
        snapshot: None,
    })
}

#[cfg(not(feature = "sqlite"))]
async fn open_sqlite(_path: &Path) -> Result<OpenStore, Box<dyn std::error::Error>> {
    Err("SQLite backend requires the 'sqlite' feature; use --backend inmemory".into())
}

/// Settings for the authorized_keys file from the command line.
pub fn config(args: &GlobalArgs) -> Config {
    let path = args
        .authorized_keys
        .clone()
        .unwrap_or_else(default_authorized_keys_path);
    Config::new(path).with_command(args.forced_command.as_str())
}

pub fn manager(args: &GlobalArgs, store: &OpenStore) -> UserManager {
    UserManager::new(store.store(), AuthorizedKeys::from_config(&config(args)))
}
