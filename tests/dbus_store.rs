//! Integration tests against a real Secret Service.
//!
//! Ignored by default: they need a session bus with an unlocked keyring
//! daemon, which CI boxes usually lack.

#![cfg(target_os = "linux")]

use keyring_sync::{AccountKey, CollectionSelection, DbusSecretStore, SecretStore, StoreError};

fn test_key() -> AccountKey {
    AccountKey::new("keyring-sync-test", "test-user@example.com")
}

#[tokio::test]
#[ignore] // Requires a running secret service
async fn round_trip_against_default_collection() -> anyhow::Result<()> {
    let store = DbusSecretStore::connect(CollectionSelection::Default).await?;
    let key = test_key();

    store
        .store_secret(&key, "keyring-sync test entry", "test-secret")
        .await?;
    let found = store.search_secrets(&key, true).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].secret.as_ref().unwrap().as_str(), "test-secret");

    assert_eq!(store.delete_secrets(&key).await?, 1);
    assert!(store.search_secrets(&key, false).await?.is_empty());
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a running secret service
async fn replace_keeps_a_single_item() -> anyhow::Result<()> {
    let store = DbusSecretStore::connect(CollectionSelection::Default).await?;
    let key = test_key();

    store.store_secret(&key, "keyring-sync test entry", "first").await?;
    store.store_secret(&key, "keyring-sync test entry", "second").await?;

    let found = store.search_secrets(&key, true).await?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].secret.as_ref().unwrap().as_str(), "second");

    store.delete_secrets(&key).await?;
    Ok(())
}

#[tokio::test]
#[ignore] // Requires a running secret service
async fn unknown_collection_label_is_reported() {
    let result =
        DbusSecretStore::connect(CollectionSelection::Labeled("no-such-keyring".to_string())).await;
    assert!(matches!(result, Err(StoreError::CollectionNotFound(_))));
}
