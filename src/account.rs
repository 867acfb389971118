//! Account registry capability consumed from the host chat client.
//!
//! The host owns its accounts and delivers lifecycle signals; this crate only
//! reads credential fields, toggles the remember/enabled flags, and derives
//! the natural key a stored secret is filed under.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Attribute key carrying the item schema name, as desktop keyrings file it.
pub const ATTR_SCHEMA: &str = "xdg:schema";
/// Schema name marking items owned by this plugin.
pub const ITEM_SCHEMA: &str = "im.AccountPassword";
/// Attribute key for the account's protocol identifier.
pub const ATTR_PROTOCOL: &str = "protocol";
/// Attribute key for the account's username.
pub const ATTR_USERNAME: &str = "username";

// ---------------------------------------------------------------------------
// Natural key
// ---------------------------------------------------------------------------

/// The (protocol, username) pair a stored credential is keyed by.
///
/// Unique at any instant; a renamed account simply maps to a new key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountKey {
    pub protocol: String,
    pub username: String,
}

impl AccountKey {
    pub fn new(protocol: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            username: username.into(),
        }
    }

    /// Key of the given host account.
    pub fn for_account(account: &dyn Account) -> Self {
        Self::new(account.protocol_id(), account.username())
    }

    /// Attribute mapping used both as the search schema and the uniqueness
    /// key for replace semantics.
    pub fn attributes(&self) -> HashMap<&'static str, &str> {
        HashMap::from([
            (ATTR_SCHEMA, ITEM_SCHEMA),
            (ATTR_PROTOCOL, self.protocol.as_str()),
            (ATTR_USERNAME, self.username.as_str()),
        ])
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.protocol, self.username)
    }
}

// ---------------------------------------------------------------------------
// Host account surface
// ---------------------------------------------------------------------------

/// One account as the host exposes it.
///
/// Password text crosses this boundary wrapped in [`Zeroizing`] so transient
/// copies are wiped on drop; the host keeps ownership of the real buffer.
pub trait Account: Send + Sync {
    /// Stable protocol identifier, e.g. `prpl-jabber`.
    fn protocol_id(&self) -> String;
    /// Human-readable protocol name used in labels and notifications.
    fn protocol_name(&self) -> String;
    fn username(&self) -> String;

    /// The in-memory password, if one is currently held.
    fn password(&self) -> Option<Zeroizing<String>>;
    /// Replace or clear the in-memory password.
    fn set_password(&self, password: Option<&str>);

    /// Whether the host persists this password in its own account store.
    fn remember_password(&self) -> bool;
    fn set_remember_password(&self, remember: bool);

    fn enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
}

/// Shared handle to a host account.
pub type AccountHandle = Arc<dyn Account>;

/// Enumeration of the host's account book.
pub trait AccountRegistry: Send + Sync {
    fn all_accounts(&self) -> Vec<AccountHandle>;
    fn active_accounts(&self) -> Vec<AccountHandle>;
}

// ---------------------------------------------------------------------------
// Lifecycle signals
// ---------------------------------------------------------------------------

/// Classified connection failure, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    AuthenticationFailed,
    NetworkError,
    /// Any failure the bridge does not react to.
    Other,
}

/// Account lifecycle signal delivered by the host, in delivery order.
#[derive(Clone)]
pub enum AccountEvent {
    Added(AccountHandle),
    Removed(AccountHandle),
    Enabled(AccountHandle),
    Disabled(AccountHandle),
    SignedOn(AccountHandle),
    ConnectionError {
        account: AccountHandle,
        kind: ConnectionErrorKind,
        description: String,
    },
}

impl fmt::Debug for AccountEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added(a) => write!(f, "Added({})", AccountKey::for_account(a.as_ref())),
            Self::Removed(a) => write!(f, "Removed({})", AccountKey::for_account(a.as_ref())),
            Self::Enabled(a) => write!(f, "Enabled({})", AccountKey::for_account(a.as_ref())),
            Self::Disabled(a) => write!(f, "Disabled({})", AccountKey::for_account(a.as_ref())),
            Self::SignedOn(a) => write!(f, "SignedOn({})", AccountKey::for_account(a.as_ref())),
            Self::ConnectionError { account, kind, .. } => write!(
                f,
                "ConnectionError({}, {kind:?})",
                AccountKey::for_account(account.as_ref())
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
