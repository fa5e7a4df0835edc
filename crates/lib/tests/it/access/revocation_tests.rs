use gatehouse::{
    IdentityStore,
    access::{AccessError, plan_revocation, revoke_access},
    store::InMemory,
};

use crate::helpers::{FailingStore, create_repo, test_store};

#[tokio::test]
async fn test_revoke_from_shared_repositories() {
    let store = test_store().await;
    create_repo(store.as_ref(), "run", &["silver", "slot"]).await;
    create_repo(store.as_ref(), "stay", &["cnot", "silver"]).await;
    create_repo(store.as_ref(), "untouched", &["slot"]).await;

    let revoked = revoke_access(store.as_ref(), "silver").await.unwrap();

    assert_eq!(revoked, vec!["run", "stay"]);
    assert_eq!(store.find_repository("run").await.unwrap().users, vec!["slot"]);
    assert_eq!(store.find_repository("stay").await.unwrap().users, vec!["cnot"]);
    assert_eq!(store.find_repository("untouched").await.unwrap().users, vec!["slot"]);
}

#[tokio::test]
async fn test_revoke_user_without_repositories() {
    let store = test_store().await;
    create_repo(store.as_ref(), "elsewhere", &["ana"]).await;

    let revoked = revoke_access(store.as_ref(), "nobody").await.unwrap();

    assert!(revoked.is_empty());
}

#[tokio::test]
async fn test_sole_grantee_blocks_every_change() {
    let store = test_store().await;
    create_repo(store.as_ref(), "proj1", &["umi", "ana"]).await;
    create_repo(store.as_ref(), "proj2", &["umi"]).await;

    let err = revoke_access(store.as_ref(), "umi").await.unwrap_err();

    assert!(err.is_blocked());
    assert_eq!(err.blocking_repositories(), &["proj2".to_string()]);
    assert!(err.to_string().contains("only one with access"));
    // proj1 was revocable but must not have been touched
    assert_eq!(store.find_repository("proj1").await.unwrap().users, vec!["umi", "ana"]);
    assert_eq!(store.find_repository("proj2").await.unwrap().users, vec!["umi"]);
}

#[tokio::test]
async fn test_plan_matches_applied_result() {
    let store = test_store().await;
    create_repo(store.as_ref(), "a", &["x", "y", "x"]).await;
    create_repo(store.as_ref(), "b", &["y", "x"]).await;

    let plan = plan_revocation(store.as_ref(), "x").await.unwrap();
    assert!(!plan.is_blocked());
    assert_eq!(plan.revocations().len(), 2);

    let revoked = plan.apply(store.as_ref()).await.unwrap();
    assert_eq!(revoked, vec!["a", "b"]);
    assert_eq!(store.find_repository("a").await.unwrap().users, vec!["y"]);
    assert_eq!(store.find_repository("b").await.unwrap().users, vec!["y"]);
}

#[tokio::test]
async fn test_store_failure_reports_partial_progress() {
    let inner = InMemory::new();
    create_repo(&inner, "alpha", &["silver", "slot"]).await;
    create_repo(&inner, "beta", &["silver", "cnot"]).await;
    create_repo(&inner, "gamma", &["silver", "dory"]).await;
    let store = FailingStore::new(inner, &["beta"]);

    let err = revoke_access(&store, "silver").await.unwrap_err();

    match err {
        AccessError::RevocationIncomplete {
            ref username,
            ref revoked,
            ref repository,
            ..
        } => {
            assert_eq!(username, "silver");
            assert_eq!(revoked, &vec!["alpha".to_string()]);
            assert_eq!(repository, "beta");
        }
        other => panic!("expected RevocationIncomplete, got {other:?}"),
    }
    assert_eq!(store.find_repository("alpha").await.unwrap().users, vec!["slot"]);
    assert_eq!(
        store.find_repository("beta").await.unwrap().users,
        vec!["silver", "cnot"]
    );
    assert_eq!(
        store.find_repository("gamma").await.unwrap().users,
        vec!["silver", "dory"]
    );
}
