//! SQL schema definitions.
//!
//! The schema is created on connect and stamped with `SCHEMA_VERSION`.

use sqlx::AnyPool;

use super::SqlxResultExt;
use crate::store::{StoreError, StoreResult};

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    "CREATE TABLE IF NOT EXISTS users (
        name TEXT PRIMARY KEY NOT NULL
    )",
    // Keys keep their insertion order through `position`
    "CREATE TABLE IF NOT EXISTS user_keys (
        user_name TEXT NOT NULL,
        position BIGINT NOT NULL,
        key_name TEXT NOT NULL,
        content TEXT NOT NULL,
        PRIMARY KEY (user_name, position)
    )",
    "CREATE TABLE IF NOT EXISTS repositories (
        name TEXT PRIMARY KEY NOT NULL
    )",
    // Grantees by position; user_name is not unique per repository so that
    // malformed lists round-trip unchanged
    "CREATE TABLE IF NOT EXISTS repository_users (
        repository_name TEXT NOT NULL,
        position BIGINT NOT NULL,
        user_name TEXT NOT NULL,
        PRIMARY KEY (repository_name, position)
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_repository_users_user ON repository_users(user_name)",
];

/// Create tables and indexes if they don't exist.
///
/// A database stamped with any other schema version is rejected.
pub async fn initialize(pool: &AnyPool) -> StoreResult<()> {
    for statement in CREATE_TABLES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Schema creation failed - SQL: {statement}"))?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((SCHEMA_VERSION,)) => {}
        Some((found,)) => {
            return Err(StoreError::SqlxError {
                reason: format!(
                    "Unsupported schema version {found}; this build only supports version {SCHEMA_VERSION}"
                ),
                source: None,
            });
        }
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .sql_context(&format!("Index creation failed - SQL: {statement}"))?;
    }

    Ok(())
}
