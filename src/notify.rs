//! Notification sink capability.
//!
//! The host renders these; the plugin only decides what to say. Prompts
//! resolve as futures so callers can serialize them against pending store
//! round trips.

use std::future::Future;

use zeroize::Zeroizing;

/// Dialog title used for every message this plugin raises.
pub const NOTIFY_TITLE: &str = "Keyring Sync";

/// Severity of an operator-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Error,
    Warning,
    Info,
}

/// Operator-facing message and prompt surface.
pub trait Notifier: Send + Sync {
    /// Render a message. Fire-and-forget.
    fn show_message(&self, kind: MessageKind, title: &str, primary: &str, secondary: Option<&str>);

    /// Ask the operator to pick one of `choices`; resolves to the chosen
    /// index, or `None` when the dialog was dismissed.
    fn prompt_action(
        &self,
        title: &str,
        primary: &str,
        secondary: &str,
        choices: &[&str],
    ) -> impl Future<Output = Option<usize>> + Send;

    /// Ask the operator for a secret text input; `None` on cancel.
    fn prompt_input(
        &self,
        title: &str,
        primary: &str,
        secondary: &str,
    ) -> impl Future<Output = Option<Zeroizing<String>>> + Send;
}

/// Headless sink: routes messages to the log and declines every prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn show_message(&self, kind: MessageKind, title: &str, primary: &str, secondary: Option<&str>) {
        let secondary = secondary.unwrap_or("");
        match kind {
            MessageKind::Error => tracing::error!(title, primary, secondary, "notification"),
            MessageKind::Warning => tracing::warn!(title, primary, secondary, "notification"),
            MessageKind::Info => tracing::info!(title, primary, secondary, "notification"),
        }
    }

    async fn prompt_action(
        &self,
        title: &str,
        primary: &str,
        _secondary: &str,
        _choices: &[&str],
    ) -> Option<usize> {
        tracing::debug!(title, primary, "prompt declined, no operator attached");
        None
    }

    async fn prompt_input(
        &self,
        title: &str,
        primary: &str,
        _secondary: &str,
    ) -> Option<Zeroizing<String>> {
        tracing::debug!(title, primary, "input prompt declined, no operator attached");
        None
    }
}
