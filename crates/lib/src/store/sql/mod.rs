//! SQLite identity store.
//!
//! Uses sqlx with `AnyPool`. Every method that writes runs in its own
//! transaction, which gives the per-record atomicity [`IdentityStore`]
//! promises. Key and grantee order is kept through an explicit `position`
//! column.

/// Schema definition and version check.
pub mod schema;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::any::AnyPoolOptions;
use sqlx::{AnyConnection, AnyPool, Row};

use super::{IdentityStore, Repository, StoreError, StoreResult, User};
use crate::keys::Key;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Converts sqlx errors to `StoreError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    fn sql_context(self, context: &str) -> StoreResult<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> StoreResult<T> {
        self.map_err(|e| StoreError::SqlxError {
            reason: format!("{context}: {e}"),
            source: Some(e),
        })
    }
}

/// Identity store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct Sqlite {
    pool: AnyPool,
}

impl Sqlite {
    /// Open a SQLite database file, creating it and the schema if missing.
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        // mode=rwc: read-write-create
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect(&url).await
    }

    /// Create a private in-memory database, mostly useful for tests.
    pub async fn in_memory() -> StoreResult<Self> {
        // Shared cache keeps one database across the pool's connections; the
        // unique name keeps separate stores apart
        let url = format!(
            "sqlite:file:gatehouse_{}?mode=memory&cache=shared",
            uuid::Uuid::new_v4()
        );
        Self::connect(&url).await
    }

    /// Connect using a SQLite connection URL.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        // The in-memory database disappears with its last connection
        let pool = if is_in_memory {
            AnyPoolOptions::new()
                .max_connections(5)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await
        } else {
            AnyPoolOptions::new().max_connections(5).connect(url).await
        }
        .sql_context("Failed to connect to SQLite")?;

        let pragmas = if is_in_memory {
            "PRAGMA busy_timeout = 5000;"
        } else {
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;"
        };
        sqlx::query(pragmas)
            .execute(&pool)
            .await
            .sql_context("Failed to configure SQLite")?;

        schema::initialize(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    async fn load_keys(&self, user: &str) -> StoreResult<Vec<Key>> {
        let rows = sqlx::query(
            "SELECT key_name, content FROM user_keys WHERE user_name = $1 ORDER BY position",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to load user keys")?;

        rows.iter()
            .map(|row| {
                Ok(Key {
                    name: row.try_get(0).sql_context("Failed to read key name")?,
                    content: row.try_get(1).sql_context("Failed to read key content")?,
                })
            })
            .collect()
    }

    async fn load_grantees(&self, repository: &str) -> StoreResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT user_name FROM repository_users WHERE repository_name = $1 ORDER BY position",
        )
        .bind(repository)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to load repository users")?;

        rows.iter()
            .map(|row| row.try_get(0).sql_context("Failed to read user name"))
            .collect()
    }
}

async fn user_exists(conn: &mut AnyConnection, name: &str) -> StoreResult<bool> {
    let row = sqlx::query("SELECT name FROM users WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .sql_context("Failed to look up user")?;
    Ok(row.is_some())
}

async fn repository_exists(conn: &mut AnyConnection, name: &str) -> StoreResult<bool> {
    let row = sqlx::query("SELECT name FROM repositories WHERE name = $1")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .sql_context("Failed to look up repository")?;
    Ok(row.is_some())
}

async fn write_keys(conn: &mut AnyConnection, user: &str, keys: &[Key]) -> StoreResult<()> {
    sqlx::query("DELETE FROM user_keys WHERE user_name = $1")
        .bind(user)
        .execute(&mut *conn)
        .await
        .sql_context("Failed to clear user keys")?;

    for (position, key) in keys.iter().enumerate() {
        sqlx::query(
            "INSERT INTO user_keys (user_name, position, key_name, content) VALUES ($1, $2, $3, $4)",
        )
        .bind(user)
        .bind(position as i64)
        .bind(key.name.as_str())
        .bind(key.content.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to insert user key")?;
    }
    Ok(())
}

async fn write_grantees(
    conn: &mut AnyConnection,
    repository: &str,
    users: &[String],
) -> StoreResult<()> {
    sqlx::query("DELETE FROM repository_users WHERE repository_name = $1")
        .bind(repository)
        .execute(&mut *conn)
        .await
        .sql_context("Failed to clear repository users")?;

    for (position, user) in users.iter().enumerate() {
        sqlx::query(
            "INSERT INTO repository_users (repository_name, position, user_name) VALUES ($1, $2, $3)",
        )
        .bind(repository)
        .bind(position as i64)
        .bind(user.as_str())
        .execute(&mut *conn)
        .await
        .sql_context("Failed to insert repository user")?;
    }
    Ok(())
}

#[async_trait]
impl IdentityStore for Sqlite {
    async fn find_user(&self, name: &str) -> StoreResult<User> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .sql_context("Failed to acquire connection")?;
        if !user_exists(&mut conn, name).await? {
            return Err(StoreError::UserNotFound {
                name: name.to_string(),
            });
        }
        drop(conn);

        Ok(User {
            name: name.to_string(),
            keys: self.load_keys(name).await?,
        })
    }

    async fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if user_exists(&mut tx, &user.name).await? {
            return Err(StoreError::UserAlreadyExists { name: user.name });
        }

        sqlx::query("INSERT INTO users (name) VALUES ($1)")
            .bind(user.name.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to insert user")?;
        write_keys(&mut tx, &user.name, &user.keys).await?;

        tx.commit().await.sql_context("Failed to commit user")
    }

    async fn update_user_keys(&self, name: &str, keys: Vec<Key>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if !user_exists(&mut tx, name).await? {
            return Err(StoreError::UserNotFound {
                name: name.to_string(),
            });
        }
        write_keys(&mut tx, name, &keys).await?;

        tx.commit().await.sql_context("Failed to commit user keys")
    }

    async fn delete_user(&self, name: &str) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if !user_exists(&mut tx, name).await? {
            return Err(StoreError::UserNotFound {
                name: name.to_string(),
            });
        }
        write_keys(&mut tx, name, &[]).await?;
        sqlx::query("DELETE FROM users WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete user")?;

        tx.commit().await.sql_context("Failed to commit user deletion")
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let names = sqlx::query("SELECT name FROM users ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to list users")?;
        let key_rows = sqlx::query(
            "SELECT user_name, key_name, content FROM user_keys ORDER BY user_name, position",
        )
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to list user keys")?;

        let mut users: BTreeMap<String, User> = BTreeMap::new();
        for row in &names {
            let name: String = row.try_get(0).sql_context("Failed to read user name")?;
            users.insert(name.clone(), User::new(name, Vec::new()));
        }
        for row in &key_rows {
            let owner: String = row.try_get(0).sql_context("Failed to read key owner")?;
            if let Some(user) = users.get_mut(&owner) {
                user.keys.push(Key {
                    name: row.try_get(1).sql_context("Failed to read key name")?,
                    content: row.try_get(2).sql_context("Failed to read key content")?,
                });
            }
        }

        Ok(users.into_values().collect())
    }

    async fn insert_repository(&self, repository: Repository) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if repository_exists(&mut tx, &repository.name).await? {
            return Err(StoreError::RepositoryAlreadyExists {
                name: repository.name,
            });
        }

        sqlx::query("INSERT INTO repositories (name) VALUES ($1)")
            .bind(repository.name.as_str())
            .execute(&mut *tx)
            .await
            .sql_context("Failed to insert repository")?;
        write_grantees(&mut tx, &repository.name, &repository.users).await?;

        tx.commit().await.sql_context("Failed to commit repository")
    }

    async fn find_repository(&self, name: &str) -> StoreResult<Repository> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .sql_context("Failed to acquire connection")?;
        if !repository_exists(&mut conn, name).await? {
            return Err(StoreError::RepositoryNotFound {
                name: name.to_string(),
            });
        }
        drop(conn);

        Ok(Repository {
            name: name.to_string(),
            users: self.load_grantees(name).await?,
        })
    }

    async fn find_repositories_by_user(&self, user: &str) -> StoreResult<Vec<Repository>> {
        let rows = sqlx::query(
            "SELECT DISTINCT repository_name FROM repository_users WHERE user_name = $1 ORDER BY repository_name",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .sql_context("Failed to find repositories by user")?;

        let mut repositories = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get(0).sql_context("Failed to read repository name")?;
            let users = self.load_grantees(&name).await?;
            repositories.push(Repository { name, users });
        }
        Ok(repositories)
    }

    async fn update_repository_users(&self, name: &str, users: Vec<String>) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if !repository_exists(&mut tx, name).await? {
            return Err(StoreError::RepositoryNotFound {
                name: name.to_string(),
            });
        }
        write_grantees(&mut tx, name, &users).await?;

        tx.commit()
            .await
            .sql_context("Failed to commit repository users")
    }

    async fn delete_repository(&self, name: &str) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        if !repository_exists(&mut tx, name).await? {
            return Err(StoreError::RepositoryNotFound {
                name: name.to_string(),
            });
        }
        write_grantees(&mut tx, name, &[]).await?;
        sqlx::query("DELETE FROM repositories WHERE name = $1")
            .bind(name)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete repository")?;

        tx.commit()
            .await
            .sql_context("Failed to commit repository deletion")
    }

    async fn list_repositories(&self) -> StoreResult<Vec<Repository>> {
        let names = sqlx::query("SELECT name FROM repositories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .sql_context("Failed to list repositories")?;

        let mut repositories = Vec::with_capacity(names.len());
        for row in &names {
            let name: String = row.try_get(0).sql_context("Failed to read repository name")?;
            let users = self.load_grantees(&name).await?;
            repositories.push(Repository { name, users });
        }
        Ok(repositories)
    }
}
