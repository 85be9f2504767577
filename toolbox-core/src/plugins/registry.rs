//! Static registry of the sub-plugins this toolbox ships
//!
//! The registry is the single source of truth for which sub-plugins exist:
//! default settings are generated from it and enable/disable requests for
//! ids it doesn't know are ignored.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use toolbox_plugin_api::MinimalPlugin;

/// Builds a fresh, not yet loaded sub-plugin instance
pub type PluginConstructor = Arc<dyn Fn() -> Box<dyn MinimalPlugin> + Send + Sync>;

/// One registered sub-plugin
#[derive(Clone)]
pub struct RegistryEntry {
    /// Stable id, used as the settings key and command namespace
    pub id: String,
    /// Human readable name
    pub name: String,
    pub description: String,
    constructor: PluginConstructor,
    default_data: Option<Value>,
}

impl RegistryEntry {
    pub fn new<F>(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        constructor: F,
    ) -> Self
    where
        F: Fn() -> Box<dyn MinimalPlugin> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            constructor: Arc::new(constructor),
            default_data: None,
        }
    }

    /// Attach the default settings payload for this sub-plugin
    pub fn with_default_data(mut self, data: Value) -> Self {
        self.default_data = Some(data);
        self
    }

    /// Default settings payload, if the sub-plugin has settings
    pub fn default_data(&self) -> Option<&Value> {
        self.default_data.as_ref()
    }

    /// Construct a new instance
    pub fn construct(&self) -> Box<dyn MinimalPlugin> {
        (self.constructor)()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("default_data", &self.default_data)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable collection of sub-plugins
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    /// Build a registry. Later entries with an id already present are
    /// dropped with a warning.
    pub fn new(entries: impl IntoIterator<Item = RegistryEntry>) -> Self {
        let mut kept: Vec<RegistryEntry> = Vec::new();
        for entry in entries {
            if kept.iter().any(|existing| existing.id == entry.id) {
                tracing::warn!(plugin = %entry.id, "Duplicate registry id, ignoring");
                continue;
            }
            kept.push(entry);
        }
        Self { entries: kept }
    }

    pub fn get(&self, id: &str) -> Option<&RegistryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
