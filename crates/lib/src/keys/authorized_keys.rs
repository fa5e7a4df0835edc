//! Synchronizer for the on-disk `authorized_keys` file.
//!
//! The file is shared by every operation in the process, so each mutation is
//! a read-modify-write performed under a lock keyed by the file's path. New
//! contents are written to a temporary file in the same directory and renamed
//! over the target; readers (sshd) see either the old or the new file.
//!
//! Lines without a gatehouse marker are never touched, which leaves room for
//! keys an administrator maintains by hand.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, Mutex as StdMutex, PoisonError},
};

use tokio::{io::AsyncWriteExt, sync::Mutex};
use tracing::debug;

use super::{
    Key, KeyId,
    encoder::{encode, parse_key_id},
    errors::AuthorizedKeysError,
};
use crate::{config::Config, store::User};

type Result<T> = std::result::Result<T, AuthorizedKeysError>;

/// Writer locks, one per file path, shared by every handle in the process.
static FILE_LOCKS: LazyLock<StdMutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    LazyLock::new(|| StdMutex::new(HashMap::new()));

fn lock_for(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// Handle on an `authorized_keys` file.
///
/// Cloning is cheap and clones share the writer lock. Independently created
/// handles for the same path share it as well.
#[derive(Clone, Debug)]
pub struct AuthorizedKeys {
    path: PathBuf,
    command: String,
    lock: Arc<Mutex<()>>,
}

impl AuthorizedKeys {
    /// Create a handle for `path`; every key line will run `command`.
    pub fn new(path: impl Into<PathBuf>, command: impl Into<String>) -> Self {
        let path = path.into();
        let path = std::path::absolute(&path).unwrap_or(path);
        let lock = lock_for(&path);
        Self {
            path,
            command: command.into(),
            lock,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.authorized_keys_path.clone(), config.command.as_str())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Current file contents, or an empty string if the file does not exist.
    pub async fn contents(&self) -> Result<String> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(AuthorizedKeysError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Identities of all managed lines, in file order.
    pub async fn managed_ids(&self) -> Result<Vec<KeyId>> {
        let contents = self.contents().await?;
        Ok(contents.lines().filter_map(parse_key_id).collect())
    }

    /// Add the line for a single key owned by `user`.
    pub async fn add_line(&self, user: &str, key: &Key) -> Result<()> {
        self.add_keys(user, std::slice::from_ref(key)).await
    }

    /// Add lines for `keys`, all owned by `user`.
    ///
    /// A key whose identity is already present has its line replaced, so the
    /// file never holds two lines for the same key.
    pub async fn add_keys(&self, user: &str, keys: &[Key]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let ids: HashSet<KeyId> = keys
            .iter()
            .map(|key| KeyId::new(user, key.name.as_str()))
            .collect();
        let encoded: Vec<String> = keys
            .iter()
            .map(|key| encode(user, key, &self.command))
            .collect();

        self.rewrite(move |lines| {
            let mut kept: Vec<String> = lines
                .into_iter()
                .filter(|line| !parse_key_id(line).is_some_and(|id| ids.contains(&id)))
                .collect();
            kept.extend(encoded);
            kept
        })
        .await?;
        Ok(())
    }

    /// Drop every managed line whose identity matches `predicate`.
    ///
    /// Returns the number of lines removed.
    pub async fn remove_lines<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&KeyId) -> bool + Send + Sync,
    {
        let mut removed = 0;
        self.rewrite(|lines| {
            let before = lines.len();
            let kept: Vec<String> = lines
                .into_iter()
                .filter(|line| !parse_key_id(line).is_some_and(|id| predicate(&id)))
                .collect();
            removed = before - kept.len();
            kept
        })
        .await?;
        Ok(removed)
    }

    /// Drop the line for `user`'s key named `key_name`.
    pub async fn remove_key(&self, user: &str, key_name: &str) -> Result<usize> {
        self.remove_lines(|id| id.user == user && id.key == key_name)
            .await
    }

    /// Drop every line belonging to `user`.
    pub async fn remove_all_for_user(&self, user: &str) -> Result<usize> {
        self.remove_lines(|id| id.user == user).await
    }

    /// Regenerate all managed lines from the full set of users.
    ///
    /// Unmanaged lines are kept in place ahead of the managed ones.
    pub async fn rebuild(&self, users: &[User]) -> Result<()> {
        let encoded: Vec<String> = users
            .iter()
            .flat_map(|user| {
                user.keys
                    .iter()
                    .map(|key| encode(&user.name, key, &self.command))
            })
            .collect();

        self.rewrite(move |lines| {
            let mut kept: Vec<String> = lines
                .into_iter()
                .filter(|line| parse_key_id(line).is_none())
                .collect();
            kept.extend(encoded);
            kept
        })
        .await?;
        Ok(())
    }

    /// Apply `edit` to the current lines under the writer lock.
    ///
    /// Returns `false` when the edit left the file unchanged, in which case
    /// nothing is written.
    async fn rewrite<F>(&self, edit: F) -> Result<bool>
    where
        F: FnOnce(Vec<String>) -> Vec<String>,
    {
        let _guard = self.lock.lock().await;

        let current: Vec<String> = self.contents().await?.lines().map(String::from).collect();
        let updated = edit(current.clone());
        if updated == current {
            return Ok(false);
        }

        self.write_atomic(&updated).await?;
        debug!(
            path = %self.path.display(),
            lines = updated.len(),
            "Rewrote authorized keys file"
        );
        Ok(true)
    }

    async fn write_atomic(&self, lines: &[String]) -> Result<()> {
        let invalid = || AuthorizedKeysError::InvalidPath {
            path: self.path.clone(),
        };
        let dir = self.path.parent().ok_or_else(invalid)?;
        let file_name = self.path.file_name().ok_or_else(invalid)?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| AuthorizedKeysError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;

        let tmp_path = dir.join(format!(
            ".{}.{}.tmp",
            file_name.to_string_lossy(),
            uuid::Uuid::new_v4()
        ));

        let mut contents = lines.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        if let Err(source) = write_new_file(&tmp_path, contents.as_bytes()).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AuthorizedKeysError::Write {
                path: self.path.clone(),
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AuthorizedKeysError::Write {
                path: self.path.clone(),
                source,
            });
        }
        Ok(())
    }
}

async fn write_new_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}
