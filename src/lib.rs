//! Keyring-backed password storage for chat accounts.
//!
//! A plugin core for extensible chat clients: account passwords live in the
//! desktop secret service instead of the client's own configuration file.
//! The host supplies its account registry, notification UI, and preference
//! store through traits; this crate supplies the synchronization logic:
//! - store a password when an account is added or signs on, then scrub the
//!   in-memory copy
//! - load it back when an account is enabled or hits a network error
//! - delete it when the account is removed
//! - keep the collection's lock state in order around every operation
//!
//! Backends: the real Secret Service over the session bus (Linux), and an
//! in-memory store for tests and headless hosts.

pub mod account;
pub mod bridge;
pub mod controller;
pub mod notify;
pub mod prefs;
pub mod store;

// Re-export for convenience
pub use account::{
    Account, AccountEvent, AccountHandle, AccountKey, AccountRegistry, ConnectionErrorKind,
};
pub use bridge::CredentialBridge;
#[cfg(target_os = "linux")]
pub use bridge::connect_store;
pub use controller::{scrub_password, SyncController, SCRUB_FILLER};
pub use notify::{LogNotifier, MessageKind, Notifier, NOTIFY_TITLE};
pub use prefs::{ActivationStatus, MemoryPrefs, PluginSettings, Prefs};
pub use store::{CollectionSelection, MemoryStore, SecretEntry, SecretStore, StoreError};

#[cfg(target_os = "linux")]
pub use store::DbusSecretStore;
