//! Credential sync controller: the write, read, and delete paths.
//!
//! Every path serializes per account identity through a keyed async mutex,
//! checks the collection lock state first, and converts failures into
//! operator notifications at its own boundary. Nothing here retries and
//! nothing terminates the host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::account::{Account, AccountHandle, AccountKey};
use crate::notify::{MessageKind, Notifier, NOTIFY_TITLE};
use crate::store::{self, SecretStore, StoreError};

/// Non-secret filler written over the in-memory password before it is
/// cleared, so the plaintext does not linger in the host's buffer.
pub const SCRUB_FILLER: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
     Cras eu semper eros. Donec non gravida mi.";

/// Item label shown in secret-manager UIs.
fn item_label(account: &dyn Account) -> String {
    format!("{}: chat account password", account.protocol_name())
}

/// Overwrite the account's in-memory plaintext with filler, then drop it.
pub fn scrub_password(account: &dyn Account) {
    account.set_password(Some(SCRUB_FILLER));
    account.set_password(None);
}

/// See the module docs.
pub struct SyncController<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    locks: Mutex<HashMap<AccountKey, Arc<AsyncMutex<()>>>>,
}

impl<S: SecretStore, N: Notifier> SyncController<S, N> {
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            store,
            notifier,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// At most one store operation runs per identity at a time.
    async fn lock_identity(&self, key: &AccountKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap();
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    fn notify_account_error(&self, account: &dyn Account, primary: &str, error: &StoreError) {
        let message = format!("Error in {} account: {}", account.protocol_name(), primary);
        self.notifier.show_message(
            MessageKind::Error,
            NOTIFY_TITLE,
            &message,
            Some(&error.to_string()),
        );
    }

    /// Persist the account's in-memory password, replacing any stored entry.
    ///
    /// On success the in-memory plaintext is overwritten with filler and
    /// cleared, and the remember-password flag is reset so the host does not
    /// re-persist the value in its own store. On failure the in-memory state
    /// is left untouched, the operator is notified, and there is no retry.
    /// Accounts holding no password are skipped. Returns whether a store
    /// round trip was made.
    pub async fn store_password(&self, account: &AccountHandle) -> Result<bool, StoreError> {
        let key = AccountKey::for_account(account.as_ref());
        let Some(password) = account.password().filter(|p| !p.is_empty()) else {
            tracing::debug!(account = %key, "no in-memory password to store");
            return Ok(false);
        };

        let _guard = self.lock_identity(&key).await;
        tracing::debug!(account = %key, "storing password");

        let result = async {
            self.store.ensure_unlocked().await?;
            self.store
                .store_secret(&key, &item_label(account.as_ref()), &password)
                .await
        }
        .await;

        if let Err(error) = result {
            self.notify_account_error(
                account.as_ref(),
                "could not save the password to the keyring",
                &error,
            );
            return Err(error);
        }

        // Scrub only once the store confirmed the write; any earlier and a
        // failed write would have destroyed the only copy.
        drop(password);
        scrub_password(account.as_ref());
        account.set_remember_password(false);
        tracing::info!(account = %key, "password stored, cleared from memory");
        Ok(true)
    }

    /// Populate the account's password from the store.
    ///
    /// Skipped entirely when the account already remembers its password in
    /// the host's own store. The search is awaited inline so it cannot race
    /// the host's password dialog. Returns whether a secret was found.
    pub async fn load_password(&self, account: &AccountHandle) -> Result<bool, StoreError> {
        if account.remember_password() {
            return Ok(false);
        }
        let key = AccountKey::for_account(account.as_ref());
        let _guard = self.lock_identity(&key).await;

        let result = async {
            self.store.ensure_unlocked().await?;
            self.store.search_secrets(&key, true).await
        }
        .await;

        let entries = match result {
            Ok(entries) => entries,
            Err(error) => {
                self.notify_account_error(
                    account.as_ref(),
                    "could not read the password from the keyring",
                    &error,
                );
                return Err(error);
            }
        };

        let Some(entry) = store::newest(entries) else {
            tracing::debug!(account = %key, "no stored password");
            return Ok(false);
        };
        if let Some(secret) = entry.secret {
            account.set_password(Some(&secret));
            tracing::debug!(account = %key, "password loaded from keyring");
            return Ok(true);
        }
        tracing::debug!(account = %key, "matching item had no loadable secret");
        Ok(false)
    }

    /// Remove the stored secret for the account.
    ///
    /// The remember-password flag is cleared up front, success or not. The
    /// delete round trip is only issued when the search found something.
    /// Failures are logged, never raised as dialogs. Returns whether
    /// anything was deleted.
    pub async fn delete_password(&self, account: &AccountHandle) -> Result<bool, StoreError> {
        account.set_remember_password(false);
        let key = AccountKey::for_account(account.as_ref());
        let _guard = self.lock_identity(&key).await;

        let result = async {
            self.store.ensure_unlocked().await?;
            let entries = self.store.search_secrets(&key, false).await?;
            if entries.is_empty() {
                return Ok(None);
            }
            self.store.delete_secrets(&key).await.map(Some)
        }
        .await;

        match result {
            Ok(None) => {
                tracing::debug!(account = %key, "no stored password to delete");
                Ok(false)
            }
            Ok(Some(removed)) => {
                tracing::info!(account = %key, removed, "deleted stored password");
                Ok(true)
            }
            Err(error) => {
                tracing::warn!(account = %key, error = %error, "could not delete stored password");
                Err(error)
            }
        }
    }

    /// Run the write path over every given account. Per-account failures do
    /// not stop the sweep.
    pub async fn save_all(&self, accounts: &[AccountHandle]) {
        for account in accounts {
            let _ = self.store_password(account).await;
        }
    }

    /// Run the delete path over every given account.
    pub async fn delete_all(&self, accounts: &[AccountHandle]) {
        for account in accounts {
            let _ = self.delete_password(account).await;
        }
    }
}
