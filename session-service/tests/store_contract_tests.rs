//! One behavioral suite, run unchanged against every store backend.

mod common;

use std::collections::BTreeMap;

use chrono::Duration;
use chrono::Utc;
use common::TestDb;
use session_service::account::models::Account;
use session_service::account::models::AccountId;
use session_service::account::models::MetadataValue;
use session_service::account::models::NewAccount;
use session_service::account::ports::AccountStore;
use session_service::memory::MemoryAccountStore;
use session_service::memory::MemoryRevocationStore;
use session_service::repositories::PostgresAccountStore;
use session_service::repositories::PostgresRevocationStore;
use session_service::revocation::ports::RevocationStore;
use session_service::AuthError;

fn new_account(username: &str) -> NewAccount {
    NewAccount::new(username, format!("{}@example.com", username), "$argon2id$hash")
        .with_roles(["user"])
        .with_metadata("created_by", "system")
}

async fn create_then_lookup<S: AccountStore>(store: &S) {
    let created = store
        .create(
            new_account("alice")
                .with_roles(["user", "admin"])
                .with_metadata("logins", 3_i64)
                .with_metadata(
                    "ratio",
                    MetadataValue::Number(serde_json::Number::from_f64(1.5).unwrap()),
                )
                .with_metadata("verified", true)
                .with_metadata("tags", vec!["a", "b"])
                .with_metadata(
                    "profile",
                    MetadataValue::Map(BTreeMap::from([
                        ("theme".to_string(), MetadataValue::from("dark")),
                        ("nickname".to_string(), MetadataValue::Null),
                    ])),
                ),
        )
        .await
        .expect("create alice");

    assert!(!created.id.as_str().is_empty());
    assert!(created.created_at > 0);
    assert_eq!(created.created_at, created.updated_at);

    let by_id = store.get_by_id(&created.id).await.expect("by id");
    let by_username = store.get_by_username("alice").await.expect("by username");
    let by_email = store.get_by_email("alice@example.com").await.expect("by email");

    assert_eq!(by_id, created);
    assert_eq!(by_username, created);
    assert_eq!(by_email, created);
    assert_eq!(
        by_id.roles.iter().cloned().collect::<Vec<_>>(),
        vec!["admin".to_string(), "user".to_string()]
    );
    assert_eq!(by_id.metadata.get("logins"), Some(&MetadataValue::from(3_i64)));
}

async fn long_values_are_stored_verbatim<S: AccountStore>(store: &S) {
    let id = AccountId::new(format!("external-{}", "i".repeat(64)));
    let username = "u".repeat(300);
    let role = "r".repeat(120);
    let key = "k".repeat(400);

    let created = store
        .create(
            new_account(&username)
                .with_id(id.clone())
                .with_roles([role.as_str()])
                .with_metadata(key.as_str(), "value"),
        )
        .await
        .expect("create with long values");

    let found = store.get_by_id(&id).await.expect("by long id");
    assert_eq!(found, created);
    assert_eq!(found.username, username);
    assert!(found.roles.contains(&role));
    assert_eq!(found.metadata.get(&key), Some(&MetadataValue::from("value")));
}

async fn create_keeps_supplied_id<S: AccountStore>(store: &S) {
    let id = AccountId::new("00000000-0000-4000-8000-000000000001");
    let created = store
        .create(new_account("fixed").with_id(id.clone()))
        .await
        .expect("create with id");
    assert_eq!(created.id, id);

    let result = store.create(new_account("fixed2").with_id(id)).await;
    assert!(matches!(result, Err(AuthError::AlreadyExists(_))));
}

async fn create_rejects_duplicates<S: AccountStore>(store: &S) {
    store.create(new_account("bob")).await.expect("create bob");

    let same_username = NewAccount::new("bob", "other@example.com", "$argon2id$hash");
    assert!(matches!(
        store.create(same_username).await,
        Err(AuthError::AlreadyExists(_))
    ));

    let same_email = NewAccount::new("bobby", "bob@example.com", "$argon2id$hash");
    assert!(matches!(
        store.create(same_email).await,
        Err(AuthError::AlreadyExists(_))
    ));

    // Uniqueness is exact: a differently cased name is a different account.
    store
        .create(NewAccount::new("Bob", "Bob@example.com", "$argon2id$hash"))
        .await
        .expect("case-distinct account");
}

async fn lookups_report_not_found<S: AccountStore>(store: &S) {
    assert!(matches!(
        store.get_by_id(&AccountId::new("missing")).await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        store.get_by_username("missing").await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        store.get_by_email("missing@example.com").await,
        Err(AuthError::NotFound(_))
    ));
}

async fn update_replaces_children_and_keeps_created_at<S: AccountStore>(store: &S) {
    let created = store.create(new_account("carol")).await.expect("create carol");

    let mut changed = created.clone();
    changed.username = "caroline".to_string();
    changed.roles = ["auditor".to_string()].into_iter().collect();
    changed.metadata = BTreeMap::from([("team".to_string(), MetadataValue::from("blue"))]);
    changed.created_at = 0;

    let updated = store.update(changed).await.expect("update carol");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    let stored = store.get_by_id(&created.id).await.expect("reload carol");
    assert_eq!(stored, updated);
    assert_eq!(stored.roles.len(), 1);
    assert!(stored.roles.contains("auditor"));
    assert!(!stored.metadata.contains_key("created_by"));
    assert!(matches!(
        store.get_by_username("carol").await,
        Err(AuthError::NotFound(_))
    ));

    // Keeping its own username and email is never a conflict.
    store.update(stored).await.expect("no-op update");
}

async fn update_conflict_leaves_account_untouched<S: AccountStore>(store: &S) {
    let dave = store.create(new_account("dave")).await.expect("create dave");
    store.create(new_account("erin")).await.expect("create erin");

    let mut clash = dave.clone();
    clash.email = "erin@example.com".to_string();
    clash.roles.insert("admin".to_string());
    assert!(matches!(
        store.update(clash).await,
        Err(AuthError::AlreadyExists(_))
    ));

    let mut clash = dave.clone();
    clash.username = "erin".to_string();
    assert!(matches!(
        store.update(clash).await,
        Err(AuthError::AlreadyExists(_))
    ));

    assert_eq!(store.get_by_id(&dave.id).await.expect("reload dave"), dave);
}

async fn update_and_delete_missing<S: AccountStore>(store: &S) {
    let ghost = Account {
        id: AccountId::new("ghost"),
        username: "ghost".to_string(),
        email: "ghost@example.com".to_string(),
        password_hash: "$argon2id$hash".to_string(),
        roles: Default::default(),
        metadata: Default::default(),
        created_at: 0,
        updated_at: 0,
    };
    assert!(matches!(
        store.update(ghost).await,
        Err(AuthError::NotFound(_))
    ));
    assert!(matches!(
        store.delete(&AccountId::new("ghost")).await,
        Err(AuthError::NotFound(_))
    ));
}

async fn delete_removes_account_and_frees_keys<S: AccountStore>(store: &S) {
    let frank = store.create(new_account("frank")).await.expect("create frank");

    store.delete(&frank.id).await.expect("delete frank");
    assert!(matches!(
        store.get_by_id(&frank.id).await,
        Err(AuthError::NotFound(_))
    ));

    let again = store.create(new_account("frank")).await.expect("recreate frank");
    assert_ne!(again.id, frank.id);
    assert_eq!(again.metadata.len(), 1);
}

async fn returned_records_are_copies<S: AccountStore>(store: &S) {
    let grace = store.create(new_account("grace")).await.expect("create grace");

    let mut copy = store.get_by_id(&grace.id).await.expect("load grace");
    copy.roles.clear();
    copy.metadata.insert("tampered".to_string(), MetadataValue::from(true));

    assert_eq!(store.get_by_id(&grace.id).await.expect("reload grace"), grace);
}

async fn account_store_contract<S: AccountStore>(store: &S) {
    create_then_lookup(store).await;
    create_keeps_supplied_id(store).await;
    long_values_are_stored_verbatim(store).await;
    create_rejects_duplicates(store).await;
    lookups_report_not_found(store).await;
    update_replaces_children_and_keeps_created_at(store).await;
    update_conflict_leaves_account_untouched(store).await;
    update_and_delete_missing(store).await;
    delete_removes_account_and_frees_keys(store).await;
    returned_records_are_copies(store).await;
}

async fn revocation_lookup_and_idempotence<R: RevocationStore>(store: &R) {
    let now = Utc::now();
    assert!(!store.is_revoked("unknown").await.expect("lookup unknown"));

    assert!(store.revoke("jti-1", now + Duration::hours(1)).await.expect("revoke"));
    assert!(!store
        .revoke("jti-1", now + Duration::hours(1))
        .await
        .expect("revoke again"));
    assert!(store.is_revoked("jti-1").await.expect("lookup revoked"));

    // Expiry is authoritative over physical presence.
    store.revoke("jti-stale", now - Duration::seconds(1)).await.expect("revoke stale");
    assert!(!store.is_revoked("jti-stale").await.expect("lookup stale"));

    // A stale record is replaced by a fresh revocation.
    assert!(store
        .revoke("jti-stale", now + Duration::hours(1))
        .await
        .expect("revoke stale again"));
    assert!(store.is_revoked("jti-stale").await.expect("lookup replaced"));
}

async fn concurrent_revocations_have_one_winner<R: RevocationStore>(store: &R) {
    let expires_at = Utc::now() + Duration::hours(1);
    let (a, b, c, d) = tokio::join!(
        store.revoke("jti-race", expires_at),
        store.revoke("jti-race", expires_at),
        store.revoke("jti-race", expires_at),
        store.revoke("jti-race", expires_at),
    );

    let written = [a, b, c, d]
        .into_iter()
        .map(|result| result.expect("concurrent revoke"))
        .filter(|written| *written)
        .count();
    assert_eq!(written, 1);
}

async fn revocation_sweep<R: RevocationStore>(store: &R) {
    let now = Utc::now();
    store.revoke("past-1", now - Duration::minutes(5)).await.expect("revoke");
    store.revoke("past-2", now - Duration::seconds(1)).await.expect("revoke");
    store.revoke("future", now + Duration::hours(1)).await.expect("revoke");

    assert_eq!(store.sweep_expired().await.expect("sweep"), 2);
    assert!(store.is_revoked("future").await.expect("lookup future"));
    assert_eq!(store.sweep_expired().await.expect("second sweep"), 0);
}

#[tokio::test]
async fn test_memory_account_store_contract() {
    account_store_contract(&MemoryAccountStore::new()).await;
}

#[tokio::test]
async fn test_postgres_account_store_contract() {
    let Some(db) = TestDb::new().await else {
        return;
    };

    account_store_contract(&PostgresAccountStore::new(db.pool.clone())).await;
    db.cleanup().await;
}

#[tokio::test]
async fn test_memory_revocation_store_contract() {
    revocation_lookup_and_idempotence(&MemoryRevocationStore::new()).await;
    revocation_sweep(&MemoryRevocationStore::new()).await;
    concurrent_revocations_have_one_winner(&MemoryRevocationStore::new()).await;
}

#[tokio::test]
async fn test_postgres_revocation_store_contract() {
    let Some(db) = TestDb::new().await else {
        return;
    };

    revocation_lookup_and_idempotence(&PostgresRevocationStore::new(db.pool.clone())).await;
    concurrent_revocations_have_one_winner(&PostgresRevocationStore::new(db.pool.clone())).await;
    let store = PostgresRevocationStore::new(db.pool.clone());
    sqlx::query("DELETE FROM revoked_tokens")
        .execute(&db.pool)
        .await
        .expect("reset revocations");
    revocation_sweep(&store).await;
    assert_eq!(store.count().await.expect("count"), 1);

    db.cleanup().await;
}
