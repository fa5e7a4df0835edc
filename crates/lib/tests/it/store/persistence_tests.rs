//! JSON persistence of the InMemory store.

use gatehouse::{
    Key, Repository, User,
    store::{IdentityStore, InMemory, StoreError},
};
use tempfile::TempDir;

#[tokio::test]
async fn test_save_and_load_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gatehouse.json");

    let store = InMemory::new();
    store
        .insert_user(User::new("luke", vec![Key::new("homekey", "ssh-rsa lukeskey@home")]))
        .await
        .unwrap();
    store
        .insert_repository(Repository::new("xwing", ["luke", "wedge"]))
        .await
        .unwrap();
    store.save_to_file(&path).await.unwrap();

    let loaded = InMemory::load_from_file(&path).await.unwrap();
    assert_eq!(loaded.list_users().await.unwrap(), store.list_users().await.unwrap());
    assert_eq!(
        loaded.find_repository("xwing").await.unwrap().users,
        vec!["luke", "wedge"]
    );
}

#[tokio::test]
async fn test_load_missing_file_is_empty() {
    let dir = TempDir::new().unwrap();

    let store = InMemory::load_from_file(dir.path().join("absent.json"))
        .await
        .unwrap();

    assert!(store.list_users().await.unwrap().is_empty());
    assert!(store.list_repositories().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_load_rejects_unknown_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.json");
    std::fs::write(&path, r#"{"_v": 7, "users": {}, "repositories": {}}"#).unwrap();

    let err = InMemory::load_from_file(&path).await.unwrap_err();

    assert!(matches!(err, StoreError::DeserializationFailed { .. }));
}
