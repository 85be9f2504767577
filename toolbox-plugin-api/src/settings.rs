//! Persisted settings document and the per-sub-plugin slice handle

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::error::PluginError;

/// Top-level settings document, persisted as one JSON object:
///
/// ```json
/// { "minimalPlugins": { "<id>": { "on": true, "data": { } } } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolboxSettings {
    #[serde(rename = "minimalPlugins", default)]
    pub minimal_plugins: BTreeMap<String, SubPluginEntry>,
}

/// Enablement flag plus the sub-plugin's opaque settings data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubPluginEntry {
    #[serde(default)]
    pub on: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ToolboxSettings {
    /// Entry for `id`, if present
    pub fn entry(&self, id: &str) -> Option<&SubPluginEntry> {
        self.minimal_plugins.get(id)
    }

    /// Whether `id` is flagged as enabled
    pub fn is_enabled(&self, id: &str) -> bool {
        self.entry(id).is_some_and(|entry| entry.on)
    }

    /// Set the enablement flag, creating the entry if needed
    pub fn set_enabled(&mut self, id: &str, on: bool) {
        self.minimal_plugins.entry(id.to_string()).or_default().on = on;
    }

    /// Settings data for `id`
    pub fn data(&self, id: &str) -> Option<&Value> {
        self.entry(id).and_then(|entry| entry.data.as_ref())
    }

    /// Serialize to a JSON value
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The settings store shared between the lifecycle manager and slices
pub type SharedSettings = Arc<RwLock<ToolboxSettings>>;

/// Read-lock a shared settings store, recovering from poisoning
pub fn read_settings(store: &SharedSettings) -> RwLockReadGuard<'_, ToolboxSettings> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write-lock a shared settings store, recovering from poisoning
pub fn write_settings(store: &SharedSettings) -> RwLockWriteGuard<'_, ToolboxSettings> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}

/// Non-owning handle to one sub-plugin's `data` entry.
///
/// A slice can only see and replace the `data` of its own id; the `on`
/// flag stays with the lifecycle manager.
#[derive(Debug, Clone)]
pub struct SettingsSlice {
    store: Weak<RwLock<ToolboxSettings>>,
    id: String,
}

impl SettingsSlice {
    /// Create a slice of `store` for sub-plugin `id`
    pub fn new(store: &SharedSettings, id: impl Into<String>) -> Self {
        Self {
            store: Arc::downgrade(store),
            id: id.into(),
        }
    }

    /// Sub-plugin id this slice belongs to
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current data, or `None` if absent or the store is gone
    pub fn get(&self) -> Option<Value> {
        let store = self.store.upgrade()?;
        let settings = read_settings(&store);
        settings.data(&self.id).cloned()
    }

    /// Replace the data for this sub-plugin in the shared store
    pub fn set(&self, value: Value) -> Result<(), PluginError> {
        let store = self
            .store
            .upgrade()
            .ok_or_else(|| PluginError::custom("settings store has been dropped"))?;
        let mut settings = write_settings(&store);
        settings
            .minimal_plugins
            .entry(self.id.clone())
            .or_default()
            .data = Some(value);
        Ok(())
    }
}
