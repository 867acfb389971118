//! Account lifecycle bridge: host signals in, credential operations out.
//!
//! Write and delete paths run as fire-and-forget tasks whose handles are
//! tracked so deactivation can drain them; read paths and operator prompts
//! are awaited inline so they serialize with the host's own dialogs.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::account::{
    AccountEvent, AccountHandle, AccountKey, AccountRegistry, ConnectionErrorKind,
};
use crate::controller::{scrub_password, SyncController};
use crate::notify::{MessageKind, Notifier, NOTIFY_TITLE};
use crate::prefs::{ActivationStatus, Prefs};
use crate::store::SecretStore;

/// Connect to the Secret Service with the configured collection, reporting
/// failure to the operator.
///
/// `None` means the plugin has no store to work with this session; the host
/// stays up either way, which is why this does not return a `Result`.
#[cfg(target_os = "linux")]
pub async fn connect_store(
    prefs: &impl Prefs,
    notifier: &impl Notifier,
) -> Option<crate::store::DbusSecretStore> {
    use crate::store::{DbusSecretStore, StoreError};

    match DbusSecretStore::connect(prefs.collection_selection()).await {
        Ok(store) => Some(store),
        Err(error) => {
            let primary = match &error {
                StoreError::CollectionNotFound(_) => "Could not load the keyring collection",
                _ => "Could not connect to the keyring service",
            };
            notifier.show_message(
                MessageKind::Error,
                NOTIFY_TITLE,
                primary,
                Some(&error.to_string()),
            );
            None
        }
    }
}

/// See the module docs.
pub struct CredentialBridge<S, R, N, P> {
    store: Arc<S>,
    registry: Arc<R>,
    notifier: Arc<N>,
    prefs: Arc<P>,
    controller: Arc<SyncController<S, N>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S, R, N, P> CredentialBridge<S, R, N, P>
where
    S: SecretStore + 'static,
    R: AccountRegistry + 'static,
    N: Notifier + 'static,
    P: Prefs + 'static,
{
    pub fn new(store: Arc<S>, registry: Arc<R>, notifier: Arc<N>, prefs: Arc<P>) -> Self {
        let controller = Arc::new(SyncController::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
        ));
        Self {
            store,
            registry,
            notifier,
            prefs,
            controller,
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn controller(&self) -> &Arc<SyncController<S, N>> {
        &self.controller
    }

    // -----------------------------------------------------------------------
    // Plugin lifecycle
    // -----------------------------------------------------------------------

    /// Plugin activation.
    ///
    /// Unlocks the collection (reporting failure without aborting), runs the
    /// first-activation migration prompt, and otherwise brings stored
    /// passwords into memory. When the collection was found locked, active
    /// accounts are disabled before loading so they cannot race connection
    /// attempts against still-missing passwords.
    pub async fn activate(&self) {
        let was_locked = match self.store.ensure_unlocked().await {
            Ok(was_locked) => was_locked,
            Err(error) => {
                self.notifier.show_message(
                    MessageKind::Error,
                    NOTIFY_TITLE,
                    "Could not unlock the keyring",
                    Some(&error.to_string()),
                );
                false
            }
        };

        if self.prefs.activation_status() == ActivationStatus::NeverLoaded {
            self.offer_migration().await;
        } else {
            let accounts = self.registry.active_accounts();
            if was_locked {
                for account in &accounts {
                    account.set_enabled(false);
                }
            }
            for account in &accounts {
                let _ = self.controller.load_password(account).await;
            }
        }

        self.prefs.set_activation_status(ActivationStatus::Loaded);
        tracing::info!("credential bridge activated");
    }

    /// Plugin deactivation: drain in-flight operations, honor the auto-lock
    /// policy, persist the activation transition.
    pub async fn deactivate(&self) {
        self.flush().await;
        if self.prefs.auto_lock() {
            if let Err(error) = self.store.ensure_locked().await {
                tracing::warn!(error = %error, "could not lock the keyring at deactivation");
            }
        }
        if self.prefs.activation_status() == ActivationStatus::Loaded {
            self.prefs.set_activation_status(ActivationStatus::Unloaded);
        }
        tracing::info!("credential bridge deactivated");
    }

    async fn offer_migration(&self) {
        let consent = self
            .notifier
            .prompt_action(
                NOTIFY_TITLE,
                "Do you want to move your passwords to the keyring?",
                "You can do this later with the \"save all passwords\" action.",
                &["Yes", "No"],
            )
            .await;
        if consent == Some(0) {
            self.controller.save_all(&self.registry.all_accounts()).await;
        }
    }

    // -----------------------------------------------------------------------
    // Event dispatch
    // -----------------------------------------------------------------------

    /// Drive the bridge from the host's event channel until it closes.
    pub async fn run(&self, mut events: mpsc::Receiver<AccountEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_event(event).await;
        }
        tracing::debug!("account event channel closed");
    }

    /// Translate one host signal into the matching credential operation.
    pub async fn handle_event(&self, event: AccountEvent) {
        tracing::debug!(?event, "account event");
        match event {
            AccountEvent::Added(account) => {
                if self.prefs.auto_save() {
                    self.spawn_store(account);
                }
            }
            AccountEvent::Removed(account) => {
                if self.prefs.auto_save() {
                    self.spawn_delete(account);
                }
            }
            AccountEvent::Enabled(account) => {
                let _ = self.controller.load_password(&account).await;
            }
            AccountEvent::Disabled(account) => {
                tracing::debug!(
                    account = %AccountKey::for_account(account.as_ref()),
                    "account disabled"
                );
            }
            AccountEvent::SignedOn(account) => self.on_signed_on(account),
            AccountEvent::ConnectionError {
                account,
                kind,
                description,
            } => {
                self.on_connection_error(account, kind, &description).await;
            }
        }
    }

    fn on_signed_on(&self, account: AccountHandle) {
        let holds_password = account.password().is_some_and(|p| !p.is_empty());
        if !holds_password {
            return;
        }
        if account.remember_password() {
            self.spawn_store(account);
        } else {
            // Transient account; the password must not outlive the session.
            scrub_password(account.as_ref());
            tracing::debug!(
                account = %AccountKey::for_account(account.as_ref()),
                "cleared transient password after sign-on"
            );
        }
    }

    async fn on_connection_error(
        &self,
        account: AccountHandle,
        kind: ConnectionErrorKind,
        description: &str,
    ) {
        let key = AccountKey::for_account(account.as_ref());
        tracing::debug!(account = %key, ?kind, description, "connection error");
        match kind {
            ConnectionErrorKind::AuthenticationFailed => {
                let reply = self
                    .notifier
                    .prompt_input(
                        NOTIFY_TITLE,
                        "Could not connect to the server because authentication failed.",
                        "Enter the correct password. It will be saved to the selected keyring.",
                    )
                    .await;
                if let Some(password) = reply {
                    account.set_password(Some(&password));
                    let _ = self.controller.store_password(&account).await;
                }
            }
            ConnectionErrorKind::NetworkError => {
                // The password may simply never have been loaded.
                let _ = self.controller.load_password(&account).await;
            }
            ConnectionErrorKind::Other => {}
        }
    }

    // -----------------------------------------------------------------------
    // Operator actions
    // -----------------------------------------------------------------------

    /// Operator action: push every known account's password into the keyring.
    pub async fn save_all_passwords(&self) {
        self.controller.save_all(&self.registry.all_accounts()).await;
    }

    /// Operator action: remove every known account's password from the
    /// keyring.
    pub async fn delete_all_passwords(&self) {
        self.controller.delete_all(&self.registry.all_accounts()).await;
    }

    // -----------------------------------------------------------------------
    // Task tracking
    // -----------------------------------------------------------------------

    fn spawn_store(&self, account: AccountHandle) {
        let controller = Arc::clone(&self.controller);
        self.track(tokio::spawn(async move {
            let _ = controller.store_password(&account).await;
        }));
    }

    fn spawn_delete(&self, account: AccountHandle) {
        let controller = Arc::clone(&self.controller);
        self.track(tokio::spawn(async move {
            let _ = controller.delete_password(&account).await;
        }));
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap();
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Wait for every in-flight fire-and-forget operation to settle.
    pub async fn flush(&self) {
        let tasks: Vec<_> = self.tasks.lock().unwrap().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }
}
