//! SQLite-specific store behavior.

use gatehouse::{
    Key, Repository, User,
    store::{IdentityStore, Sqlite},
};
use tempfile::TempDir;

#[tokio::test]
async fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gatehouse.db");

    {
        let store = Sqlite::open(&path).await.unwrap();
        store
            .insert_user(User::new("piccolo", vec![Key::new("somekey", "idrsakey piccolo@myhost")]))
            .await
            .unwrap();
        store
            .insert_repository(Repository::new("namek", ["piccolo", "gohan"]))
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = Sqlite::open(&path).await.unwrap();
    assert_eq!(
        store.find_user("piccolo").await.unwrap().keys,
        vec![Key::new("somekey", "idrsakey piccolo@myhost")]
    );
    assert_eq!(
        store.find_repositories_by_user("gohan").await.unwrap(),
        vec![Repository::new("namek", ["piccolo", "gohan"])]
    );
}

#[tokio::test]
async fn test_in_memory_stores_are_isolated() {
    let first = Sqlite::in_memory().await.unwrap();
    let second = Sqlite::in_memory().await.unwrap();

    first.insert_user(User::new("alice", vec![])).await.unwrap();

    assert!(second.find_user("alice").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_unknown_schema_version_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gatehouse.db");

    {
        let store = Sqlite::open(&path).await.unwrap();
        sqlx::query("UPDATE schema_version SET version = 99")
            .execute(store.pool())
            .await
            .unwrap();
        store.pool().close().await;
    }

    let err = Sqlite::open(&path).await.unwrap_err();

    assert!(err.is_storage_error());
    assert!(err.to_string().contains("Unsupported schema version 99"));
}
