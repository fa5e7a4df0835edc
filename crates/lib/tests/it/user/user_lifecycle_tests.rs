//! User creation and removal through the UserManager
//!
//! Covers validation, store persistence, `authorized_keys` lines and the
//! sole-grantee rule on removal.

use std::sync::Arc;

use gatehouse::{ErrorKind, KeyId, store::InMemory, user::UserError};

use crate::helpers::*;

// ===== CREATE TESTS =====

#[tokio::test]
async fn test_create_user_persists_and_writes_keys() {
    let env = setup().await;

    let user = env
        .create_user("piccolo", vec![key("somekey", "idrsakey piccolo@myhost")])
        .await;

    assert_eq!(user.name, "piccolo");
    assert_eq!(env.stored_user("piccolo").await, user);

    let content = env.authorized_keys_content().await;
    let expected = format!(
        "command=\"{TEST_COMMAND} piccolo\",no-port-forwarding,no-X11-forwarding,no-agent-forwarding,no-pty idrsakey piccolo@myhost gatehouse-key=piccolo/{}\n",
        hex::encode("somekey")
    );
    assert_eq!(content, expected);
}

#[tokio::test]
async fn test_create_user_with_multiple_keys() {
    let env = setup().await;

    env.create_user(
        "vegeta",
        vec![key("home", "ssh-rsa HOME"), key("work", "ssh-ed25519 WORK")],
    )
    .await;

    let mut ids = env.authorized_keys().managed_ids().await.unwrap();
    ids.sort();
    assert_eq!(
        ids,
        vec![KeyId::new("vegeta", "home"), KeyId::new("vegeta", "work")]
    );
}

#[tokio::test]
async fn test_create_user_without_keys_leaves_file_alone() {
    let env = setup().await;

    env.create_user("quiet", vec![]).await;

    assert!(env.stored_user("quiet").await.keys.is_empty());
    assert!(!env.authorized_keys_path().exists());
}

#[tokio::test]
async fn test_create_user_invalid_name() {
    let env = setup().await;

    for name in ["", "-dash", "has space", "semi;colon", "new\nline"] {
        let err = env
            .manager
            .create_user(name, vec![key("k", "ssh-rsa AAAA")])
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Validation Error: user name is not valid");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    assert!(env.store.list_users().await.unwrap().is_empty());
    assert!(!env.authorized_keys_path().exists());
}

#[tokio::test]
async fn test_create_user_duplicate_key_names_rejected() {
    let env = setup().await;

    let err = env
        .manager
        .create_user("dup", vec![key("same", "ssh-rsa ONE"), key("same", "ssh-rsa TWO")])
        .await
        .unwrap_err();

    assert!(err.is_validation_error());
    assert!(env.store.find_user("dup").await.is_err());
}

#[tokio::test]
async fn test_create_user_rejects_multiline_key() {
    let env = setup().await;

    let err = env
        .manager
        .create_user(
            "mallory",
            vec![key("k", "ssh-rsa RESTRICTED\nssh-ed25519 UNRESTRICTED")],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(env.store.find_user("mallory").await.unwrap_err().is_not_found());
    assert!(!env.authorized_keys_path().exists());
}

#[tokio::test]
async fn test_create_user_accepts_trailing_newline() {
    let env = setup().await;

    env.create_user("alice", vec![key("pub", "ssh-ed25519 AAAA alice@host\n")])
        .await;

    let content = env.authorized_keys_content().await;
    assert_eq!(content.lines().count(), 1);
    assert!(content.starts_with("command=\""));
}

#[tokio::test]
async fn test_create_existing_user_is_conflict() {
    let env = setup().await;
    env.create_user("alice", vec![key("first", "ssh-rsa FIRST")]).await;

    let err = env
        .manager
        .create_user("alice", vec![key("second", "ssh-rsa SECOND")])
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "User \"alice\" already exists");
    assert!(!env.authorized_keys_content().await.contains("SECOND"));
}

// ===== REMOVE TESTS =====

#[tokio::test]
async fn test_remove_user_revokes_shared_access() {
    let env = setup().await;
    env.create_user("silver", vec![key("k", "ssh-rsa SILVER")]).await;
    env.create_user("slot", vec![key("k", "ssh-rsa SLOT")]).await;
    env.create_repo("R1", &["silver", "slot"]).await;
    env.create_repo("R2", &["cnot", "silver"]).await;

    env.manager.remove_user("silver").await.unwrap();

    assert_eq!(env.stored_repository("R1").await.users, vec!["slot"]);
    assert_eq!(env.stored_repository("R2").await.users, vec!["cnot"]);
    assert!(env.store.find_user("silver").await.unwrap_err().is_not_found());

    let content = env.authorized_keys_content().await;
    assert!(!content.contains("SILVER"));
    assert!(content.contains("ssh-rsa SLOT"));
}

#[tokio::test]
async fn test_remove_sole_grantee_is_refused() {
    let env = setup().await;
    env.create_user("umi", vec![key("k", "ssh-rsa UMI")]).await;
    env.create_repo("shared", &["umi", "ana"]).await;
    env.create_repo("alone", &["umi"]).await;

    let err = env.manager.remove_user("umi").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().starts_with("Could not remove user: "));
    assert!(err.to_string().contains("only one with access"));

    // Nothing changed anywhere
    assert_eq!(env.stored_user("umi").await.keys.len(), 1);
    assert_eq!(env.stored_repository("shared").await.users, vec!["umi", "ana"]);
    assert_eq!(env.stored_repository("alone").await.users, vec!["umi"]);
    assert!(env.authorized_keys_content().await.contains("ssh-rsa UMI"));
}

#[tokio::test]
async fn test_remove_user_store_failure_mid_revocation() {
    let inner = InMemory::new();
    create_repo(&inner, "alpha", &["silver", "slot"]).await;
    create_repo(&inner, "beta", &["silver", "cnot"]).await;
    let env = setup_with_store(Arc::new(FailingStore::new(inner, &["beta"]))).await;
    env.create_user("silver", vec![key("k", "ssh-rsa SILVER")]).await;

    let err = env.manager.remove_user("silver").await.unwrap_err();

    assert!(err.to_string().starts_with("Could not remove user: "));
    assert_eq!(err.kind(), ErrorKind::Persistence);

    // The user and their key lines are kept
    assert_eq!(env.stored_user("silver").await.keys.len(), 1);
    assert_eq!(
        env.authorized_keys().managed_ids().await.unwrap(),
        vec![KeyId::new("silver", "k")]
    );
    // Repositories revoked before the failure stay revoked
    assert_eq!(env.stored_repository("alpha").await.users, vec!["slot"]);
    assert_eq!(env.stored_repository("beta").await.users, vec!["silver", "cnot"]);
}

#[tokio::test]
async fn test_remove_missing_user() {
    let env = setup().await;

    let err = env.manager.remove_user("ghost").await.unwrap_err();

    assert_eq!(err.to_string(), "Could not remove user: not found");
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        gatehouse::Error::User(UserError::RemoveNotFound { ref username }) if username == "ghost"
    ));
}

#[tokio::test]
async fn test_remove_user_without_repositories() {
    let env = setup().await;
    env.create_user("loner", vec![key("a", "ssh-rsa A"), key("b", "ssh-rsa B")]).await;

    env.manager.remove_user("loner").await.unwrap();

    assert!(env.manager.list_users().await.unwrap().is_empty());
    assert!(env.authorized_keys().managed_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_user_spares_similar_names() {
    let env = setup().await;
    env.create_user("ana", vec![key("k", "ssh-rsa ANA")]).await;
    env.create_user("anabel", vec![key("k", "ssh-rsa ANABEL")]).await;

    env.manager.remove_user("ana").await.unwrap();

    let ids = env.authorized_keys().managed_ids().await.unwrap();
    assert_eq!(ids, vec![KeyId::new("anabel", "k")]);
}

#[tokio::test]
async fn test_list_and_get_users() {
    let env = setup().await;
    env.create_user("bob", vec![]).await;
    env.create_user("alice", vec![key("k", "ssh-rsa A")]).await;

    let names: Vec<String> = env
        .manager
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["alice", "bob"]);

    let err = env.manager.get_user("umi").await.unwrap_err();
    assert_eq!(err.to_string(), "User \"umi\" not found");
}
