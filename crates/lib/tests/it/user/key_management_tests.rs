//! Key management tests: adding and removing keys of existing users

use gatehouse::{ErrorKind, KeyId};

use crate::helpers::*;

// ===== ADD KEY TESTS =====

#[tokio::test]
async fn test_add_key_appends_to_store_and_file() {
    let env = setup().await;
    env.create_user("luke", vec![key("homekey", "ssh-rsa HOME")]).await;

    env.manager
        .add_key("luke", key("workkey", "ssh-rsa WORK"))
        .await
        .unwrap();

    let user = env.stored_user("luke").await;
    assert_eq!(user.keys, vec![key("homekey", "ssh-rsa HOME"), key("workkey", "ssh-rsa WORK")]);

    let mut ids = env.authorized_keys().managed_ids().await.unwrap();
    ids.sort();
    assert_eq!(ids, vec![KeyId::new("luke", "homekey"), KeyId::new("luke", "workkey")]);
}

#[tokio::test]
async fn test_add_key_unknown_user() {
    let env = setup().await;

    let err = env
        .manager
        .add_key("umi", key("k", "ssh-rsa AAAA"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "User \"umi\" not found");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!env.authorized_keys_path().exists());
}

#[tokio::test]
async fn test_add_key_duplicate_name() {
    let env = setup().await;
    env.create_user("luke", vec![key("homekey", "ssh-rsa HOME")]).await;

    let err = env
        .manager
        .add_key("luke", key("homekey", "ssh-rsa OTHER"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(env.stored_user("luke").await.keys.len(), 1);
    assert!(!env.authorized_keys_content().await.contains("OTHER"));
}

#[tokio::test]
async fn test_add_key_rejects_multiline_content() {
    let env = setup().await;
    env.create_user("mallory", vec![key("first", "ssh-rsa FIRST")]).await;
    let before = env.authorized_keys_content().await;

    let err = env
        .manager
        .add_key("mallory", key("k", "ssh-rsa RESTRICTED\r\nssh-ed25519 UNRESTRICTED"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(env.stored_user("mallory").await.keys.len(), 1);
    assert_eq!(env.authorized_keys_content().await, before);
}

// ===== REMOVE KEY TESTS =====

#[tokio::test]
async fn test_remove_key_removes_only_that_key() {
    let env = setup().await;
    env.create_user(
        "luke",
        vec![key("homekey", "ssh-rsa SAME"), key("workkey", "ssh-rsa SAME")],
    )
    .await;

    env.manager.remove_key("luke", "homekey").await.unwrap();

    assert_eq!(
        env.stored_user("luke").await.keys,
        vec![key("workkey", "ssh-rsa SAME")]
    );
    assert_eq!(
        env.authorized_keys().managed_ids().await.unwrap(),
        vec![KeyId::new("luke", "workkey")]
    );
}

#[tokio::test]
async fn test_remove_key_unknown_key() {
    let env = setup().await;
    env.create_user("luke", vec![key("homekey", "ssh-rsa HOME")]).await;

    let err = env.manager.remove_key("luke", "nokey").await.unwrap_err();

    assert_eq!(err.to_string(), "Key \"nokey\" not found for user \"luke\"");
    assert!(err.is_not_found());
    assert_eq!(env.stored_user("luke").await.keys.len(), 1);
}

#[tokio::test]
async fn test_remove_key_unknown_user() {
    let env = setup().await;

    let err = env.manager.remove_key("umi", "homekey").await.unwrap_err();

    assert_eq!(err.to_string(), "User \"umi\" not found");
}

#[tokio::test]
async fn test_key_names_are_scoped_per_user() {
    let env = setup().await;
    env.create_user("alice", vec![key("laptop", "ssh-rsa ALICE")]).await;
    env.create_user("bob", vec![key("laptop", "ssh-rsa BOB")]).await;

    env.manager.remove_key("alice", "laptop").await.unwrap();

    let content = env.authorized_keys_content().await;
    assert!(!content.contains("ssh-rsa ALICE"));
    assert!(content.contains("ssh-rsa BOB"));
}
