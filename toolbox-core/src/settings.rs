//! Default settings generation and merge-on-load

use serde_json::Value;
use toolbox_plugin_api::{SubPluginEntry, ToolboxSettings};

use crate::error::ToolboxError;
use crate::merge::deep_merge;
use crate::plugins::Registry;

/// Settings document with every registered sub-plugin disabled and its
/// data set to the registry default.
pub fn default_settings(registry: &Registry) -> ToolboxSettings {
    let mut settings = ToolboxSettings::default();
    for entry in registry.iter() {
        settings.minimal_plugins.insert(
            entry.id.clone(),
            SubPluginEntry {
                on: false,
                data: entry.default_data().cloned(),
            },
        );
    }
    settings
}

/// Deep-merge a persisted document onto freshly generated defaults.
///
/// An absent or `null` document yields the defaults, as does a `null`
/// `minimalPlugins` map or a `null` entry inside it. Persisted entries for
/// ids the registry no longer has are kept.
pub fn merge_with_defaults(
    registry: &Registry,
    persisted: Option<&Value>,
) -> Result<ToolboxSettings, ToolboxError> {
    let defaults = default_settings(registry);
    let Some(persisted) = persisted.filter(|value| !value.is_null()) else {
        return Ok(defaults);
    };

    let persisted = without_null_entries(persisted);
    let base = defaults.to_value().map_err(ToolboxError::InvalidDocument)?;
    match deep_merge(Some(&base), Some(&persisted))? {
        Some(merged) => serde_json::from_value(merged).map_err(ToolboxError::InvalidDocument),
        None => Ok(defaults),
    }
}

/// Drop a `null` `minimalPlugins` and any `null` entry under it so the
/// merge keeps the defaults for them.
fn without_null_entries(persisted: &Value) -> Value {
    let mut document = persisted.clone();
    if let Value::Object(root) = &mut document {
        match root.get_mut(MINIMAL_PLUGINS_KEY) {
            Some(Value::Null) => {
                root.remove(MINIMAL_PLUGINS_KEY);
            }
            Some(Value::Object(entries)) => entries.retain(|_, entry| !entry.is_null()),
            _ => {}
        }
    }
    document
}

const MINIMAL_PLUGINS_KEY: &str = "minimalPlugins";
