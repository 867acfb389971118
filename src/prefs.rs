//! Host preference surface.
//!
//! Five persisted values drive the plugin: the collection choice, the
//! auto-save and auto-lock policies, and the activation-status flag behind
//! the first-run migration prompt.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::store::CollectionSelection;

/// Persisted activation flag; only job is driving the migration prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActivationStatus {
    /// The plugin has never completed an activation.
    #[default]
    NeverLoaded,
    /// Currently active.
    Loaded,
    /// Deactivated after a completed activation.
    Unloaded,
}

/// Snapshot of every preference the plugin reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub use_custom_collection: bool,
    pub collection_name: String,
    pub auto_save: bool,
    pub auto_lock: bool,
    pub activation_status: ActivationStatus,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            use_custom_collection: false,
            collection_name: String::new(),
            auto_save: true,
            auto_lock: false,
            activation_status: ActivationStatus::NeverLoaded,
        }
    }
}

/// Read side of the host's preference store, plus the one flag written back.
pub trait Prefs: Send + Sync {
    fn use_custom_collection(&self) -> bool;
    fn collection_name(&self) -> String;
    fn auto_save(&self) -> bool;
    fn auto_lock(&self) -> bool;
    fn activation_status(&self) -> ActivationStatus;
    fn set_activation_status(&self, status: ActivationStatus);

    /// Which collection the settings select. A custom name only counts when
    /// the custom-collection switch is on and the name is non-empty.
    fn collection_selection(&self) -> CollectionSelection {
        if self.use_custom_collection() {
            let name = self.collection_name();
            if !name.is_empty() {
                return CollectionSelection::Labeled(name);
            }
        }
        CollectionSelection::Default
    }
}

/// Prefs backed by an in-process snapshot, for hosts without persistent
/// preference storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    settings: RwLock<PluginSettings>,
}

impl MemoryPrefs {
    pub fn new(settings: PluginSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    pub fn snapshot(&self) -> PluginSettings {
        self.settings.read().unwrap().clone()
    }
}

impl Prefs for MemoryPrefs {
    fn use_custom_collection(&self) -> bool {
        self.settings.read().unwrap().use_custom_collection
    }

    fn collection_name(&self) -> String {
        self.settings.read().unwrap().collection_name.clone()
    }

    fn auto_save(&self) -> bool {
        self.settings.read().unwrap().auto_save
    }

    fn auto_lock(&self) -> bool {
        self.settings.read().unwrap().auto_lock
    }

    fn activation_status(&self) -> ActivationStatus {
        self.settings.read().unwrap().activation_status
    }

    fn set_activation_status(&self, status: ActivationStatus) {
        self.settings.write().unwrap().activation_status = status;
    }
}
