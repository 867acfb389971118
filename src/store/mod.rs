//! Secret-store capability.
//!
//! The controller talks to the desktop secret service through the
//! [`SecretStore`] trait:
//! - **dbus**: the real Secret Service over the session bus (Linux)
//! - **memory**: deterministic in-memory backend for tests and headless hosts
//!
//! A store is bound to exactly one collection for its whole lifetime; lock
//! state is queried from the service on every transition, never cached.

pub mod memory;

#[cfg(target_os = "linux")]
pub mod dbus;

pub use memory::MemoryStore;

#[cfg(target_os = "linux")]
pub use dbus::DbusSecretStore;

use std::fmt;
use std::future::Future;

use thiserror::Error;
use zeroize::Zeroizing;

use crate::account::AccountKey;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Store-layer failures, caught at each operation boundary and converted to
/// operator notifications. An empty search result is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The transport or session failed to open; every later call will also
    /// fail until the service comes back.
    #[error("secret service unavailable: {0}")]
    ServiceUnavailable(String),
    /// The configured collection label matched nothing.
    #[error("no collection labeled \"{0}\"")]
    CollectionNotFound(String),
    /// A create/search/delete/lock call was rejected by the service.
    #[error("store operation failed: {0}")]
    Operation(String),
}

// ---------------------------------------------------------------------------
// Common types
// ---------------------------------------------------------------------------

/// Which collection a session operates on, fixed once the session connects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CollectionSelection {
    /// The service-defined default collection alias.
    #[default]
    Default,
    /// Exact label match against the loaded collection list, first match wins.
    Labeled(String),
}

/// One search result from the store.
#[derive(Clone)]
pub struct SecretEntry {
    pub label: String,
    /// Present when the search was asked to load secret values.
    pub secret: Option<Zeroizing<String>>,
    /// Creation time in seconds since the epoch; tie-break key for duplicates.
    pub created: u64,
}

impl fmt::Debug for SecretEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretEntry")
            .field("label", &self.label)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("created", &self.created)
            .finish()
    }
}

/// The authoritative entry among duplicates: newest creation time wins.
///
/// Duplicate items for one key can only appear after a crashed writer; taking
/// the newest makes the choice deterministic instead of store-order luck.
pub fn newest(entries: Vec<SecretEntry>) -> Option<SecretEntry> {
    entries.into_iter().max_by_key(|entry| entry.created)
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// One collection of the desktop secret service.
///
/// Implementations hold their own session and absorb post-unlock handle
/// replacement internally, so callers never see a stale handle.
pub trait SecretStore: Send + Sync {
    /// Query the collection's lock state from the service.
    fn is_locked(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Unlock the collection if it is locked. Idempotent; returns whether an
    /// unlock round trip was actually issued.
    fn ensure_unlocked(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Lock the collection if it is unlocked. Idempotent; returns whether a
    /// lock round trip was actually issued.
    fn ensure_locked(&self) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Create or replace the secret stored under `key`.
    fn store_secret(
        &self,
        key: &AccountKey,
        label: &str,
        secret: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every item matching `key`, with secret values loaded when
    /// `load_secrets` is set.
    fn search_secrets(
        &self,
        key: &AccountKey,
        load_secrets: bool,
    ) -> impl Future<Output = Result<Vec<SecretEntry>, StoreError>> + Send;

    /// Delete every item matching `key`; returns how many were removed.
    fn delete_secrets(
        &self,
        key: &AccountKey,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
