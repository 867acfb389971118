//! Shared mocks for the integration tests: a scriptable host side
//! (accounts, registry, notifier) to drive the bridge and controller
//! against the in-memory store.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use keyring_sync::{Account, AccountHandle, AccountRegistry, MessageKind, Notifier};
use zeroize::Zeroizing;

/// Install a subscriber once so failing tests print the bridge's logs.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct AccountState {
    password: Option<String>,
    remember: bool,
    enabled: bool,
    /// Every value handed to `set_password`, in order.
    password_writes: Vec<Option<String>>,
}

/// Host account with recorded password writes.
pub struct MockAccount {
    protocol_id: String,
    protocol_name: String,
    username: String,
    state: Mutex<AccountState>,
}

impl MockAccount {
    pub fn new(protocol_id: &str, protocol_name: &str, username: &str) -> Arc<Self> {
        Arc::new(Self {
            protocol_id: protocol_id.to_string(),
            protocol_name: protocol_name.to_string(),
            username: username.to_string(),
            state: Mutex::new(AccountState {
                enabled: true,
                ..AccountState::default()
            }),
        })
    }

    pub fn with_password(
        protocol_id: &str,
        protocol_name: &str,
        username: &str,
        password: &str,
    ) -> Arc<Self> {
        let account = Self::new(protocol_id, protocol_name, username);
        account.state.lock().unwrap().password = Some(password.to_string());
        account
    }

    pub fn handle(self: &Arc<Self>) -> AccountHandle {
        Arc::clone(self) as AccountHandle
    }

    /// The raw in-memory password, without the trait's zeroizing wrapper.
    pub fn raw_password(&self) -> Option<String> {
        self.state.lock().unwrap().password.clone()
    }

    pub fn password_writes(&self) -> Vec<Option<String>> {
        self.state.lock().unwrap().password_writes.clone()
    }
}

impl Account for MockAccount {
    fn protocol_id(&self) -> String {
        self.protocol_id.clone()
    }

    fn protocol_name(&self) -> String {
        self.protocol_name.clone()
    }

    fn username(&self) -> String {
        self.username.clone()
    }

    fn password(&self) -> Option<Zeroizing<String>> {
        self.state
            .lock()
            .unwrap()
            .password
            .as_ref()
            .map(|p| Zeroizing::new(p.clone()))
    }

    fn set_password(&self, password: Option<&str>) {
        let mut state = self.state.lock().unwrap();
        state.password_writes.push(password.map(str::to_string));
        state.password = password.map(str::to_string);
    }

    fn remember_password(&self) -> bool {
        self.state.lock().unwrap().remember
    }

    fn set_remember_password(&self, remember: bool) {
        self.state.lock().unwrap().remember = remember;
    }

    fn enabled(&self) -> bool {
        self.state.lock().unwrap().enabled
    }

    fn set_enabled(&self, enabled: bool) {
        self.state.lock().unwrap().enabled = enabled;
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockRegistry {
    accounts: Mutex<Vec<AccountHandle>>,
}

impl MockRegistry {
    pub fn new(accounts: Vec<AccountHandle>) -> Arc<Self> {
        Arc::new(Self {
            accounts: Mutex::new(accounts),
        })
    }

    pub fn push(&self, account: AccountHandle) {
        self.accounts.lock().unwrap().push(account);
    }
}

impl AccountRegistry for MockRegistry {
    fn all_accounts(&self) -> Vec<AccountHandle> {
        self.accounts.lock().unwrap().clone()
    }

    fn active_accounts(&self) -> Vec<AccountHandle> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|account| account.enabled())
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Records messages and answers prompts with scripted replies.
#[derive(Default)]
pub struct MockNotifier {
    messages: Mutex<Vec<(MessageKind, String)>>,
    prompts: Mutex<Vec<String>>,
    action_reply: Mutex<Option<usize>>,
    input_reply: Mutex<Option<String>>,
}

impl MockNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply_action(&self, choice: Option<usize>) {
        *self.action_reply.lock().unwrap() = choice;
    }

    pub fn reply_input(&self, input: Option<&str>) {
        *self.input_reply.lock().unwrap() = input.map(str::to_string);
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(kind, _)| *kind == MessageKind::Error)
            .count()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Notifier for MockNotifier {
    fn show_message(
        &self,
        kind: MessageKind,
        _title: &str,
        primary: &str,
        _secondary: Option<&str>,
    ) {
        self.messages
            .lock()
            .unwrap()
            .push((kind, primary.to_string()));
    }

    async fn prompt_action(
        &self,
        _title: &str,
        primary: &str,
        _secondary: &str,
        _choices: &[&str],
    ) -> Option<usize> {
        self.prompts.lock().unwrap().push(primary.to_string());
        *self.action_reply.lock().unwrap()
    }

    async fn prompt_input(
        &self,
        _title: &str,
        primary: &str,
        _secondary: &str,
    ) -> Option<Zeroizing<String>> {
        self.prompts.lock().unwrap().push(primary.to_string());
        self.input_reply
            .lock()
            .unwrap()
            .as_ref()
            .map(|input| Zeroizing::new(input.clone()))
    }
}
