//! In-memory secret store.
//!
//! Deterministic backend for tests and headless hosts. Mirrors the D-Bus
//! backend's observable behavior (replace semantics, lock state, rejected
//! writes while locked) and counts the service round trips it would issue so
//! callers' call patterns can be asserted.

use std::sync::Mutex;

use zeroize::Zeroizing;

use super::{SecretEntry, SecretStore, StoreError};
use crate::account::AccountKey;

/// Service round trips issued so far, by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpCounts {
    /// Unlock requests actually sent (not idempotent no-ops).
    pub unlocks: usize,
    /// Lock requests actually sent.
    pub locks: usize,
    pub creates: usize,
    pub searches: usize,
    pub deletes: usize,
}

struct StoredItem {
    key: AccountKey,
    label: String,
    secret: Zeroizing<String>,
    created: u64,
}

#[derive(Default)]
struct Inner {
    locked: bool,
    failing: bool,
    clock: u64,
    items: Vec<StoredItem>,
    counts: OpCounts,
}

/// See the module docs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// An unlocked, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store whose collection starts out locked.
    pub fn new_locked() -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().locked = true;
        store
    }

    pub fn counts(&self) -> OpCounts {
        self.inner.lock().unwrap().counts
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every item operation fail, simulating a broken service.
    pub fn set_failing(&self, failing: bool) {
        self.inner.lock().unwrap().failing = failing;
    }

    /// Insert an item directly, bypassing replace semantics and the lock.
    ///
    /// Lets tests fabricate the duplicate entries a crashed writer could
    /// leave behind. Returns the item's creation stamp.
    pub fn inject_duplicate(&self, key: &AccountKey, label: &str, secret: &str) -> u64 {
        let mut inner = self.inner.lock().unwrap();
        inner.clock += 1;
        let created = inner.clock;
        inner.items.push(StoredItem {
            key: key.clone(),
            label: label.to_string(),
            secret: Zeroizing::new(secret.to_string()),
            created,
        });
        created
    }

    /// The newest stored secret under `key`, if any.
    pub fn secret_for(&self, key: &AccountKey) -> Option<Zeroizing<String>> {
        let inner = self.inner.lock().unwrap();
        inner
            .items
            .iter()
            .filter(|item| item.key == *key)
            .max_by_key(|item| item.created)
            .map(|item| item.secret.clone())
    }
}

impl SecretStore for MemoryStore {
    async fn is_locked(&self) -> Result<bool, StoreError> {
        Ok(self.inner.lock().unwrap().locked)
    }

    async fn ensure_unlocked(&self) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.locked {
            inner.locked = false;
            inner.counts.unlocks += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn ensure_locked(&self) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.locked {
            Ok(false)
        } else {
            inner.locked = true;
            inner.counts.locks += 1;
            Ok(true)
        }
    }

    async fn store_secret(
        &self,
        key: &AccountKey,
        label: &str,
        secret: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(StoreError::Operation("simulated store failure".into()));
        }
        if inner.locked {
            return Err(StoreError::Operation("collection is locked".into()));
        }
        inner.counts.creates += 1;
        inner.clock += 1;
        let created = inner.clock;
        // Replace semantics: at most one item per key after a create.
        inner.items.retain(|item| item.key != *key);
        inner.items.push(StoredItem {
            key: key.clone(),
            label: label.to_string(),
            secret: Zeroizing::new(secret.to_string()),
            created,
        });
        Ok(())
    }

    async fn search_secrets(
        &self,
        key: &AccountKey,
        load_secrets: bool,
    ) -> Result<Vec<SecretEntry>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(StoreError::Operation("simulated store failure".into()));
        }
        if inner.locked {
            return Err(StoreError::Operation("collection is locked".into()));
        }
        inner.counts.searches += 1;
        Ok(inner
            .items
            .iter()
            .filter(|item| item.key == *key)
            .map(|item| SecretEntry {
                label: item.label.clone(),
                secret: load_secrets.then(|| item.secret.clone()),
                created: item.created,
            })
            .collect())
    }

    async fn delete_secrets(&self, key: &AccountKey) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing {
            return Err(StoreError::Operation("simulated store failure".into()));
        }
        if inner.locked {
            return Err(StoreError::Operation("collection is locked".into()));
        }
        inner.counts.deletes += 1;
        let before = inner.items.len();
        inner.items.retain(|item| item.key != *key);
        Ok(before - inner.items.len())
    }
}
