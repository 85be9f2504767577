//! Helpers shared by the built-in sub-plugins

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use toolbox_plugin_api::{App, PluginError, SettingsSlice};

/// Prefix of every user-facing error notice
pub const ERROR_PREFIX: &str = "[ERROR in Toolbox]";

/// Validator signature shared by all sub-plugin settings types
pub type Validator<T> = fn(&Value) -> Result<T, String>;

/// Decode `value` into a settings struct, reporting the serde message
pub fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    if !value.is_object() {
        return Err("settings data must be an object".to_string());
    }
    serde_json::from_value(value.clone()).map_err(|e| e.to_string())
}

/// Current settings of a running sub-plugin, read from its slice
pub fn read_slice<T>(slice: &SettingsSlice, validate: Validator<T>) -> Result<T, PluginError> {
    let value = slice
        .get()
        .ok_or_else(|| PluginError::settings_validation(slice.id(), "settings data is missing"))?;
    validate(&value).map_err(|reason| PluginError::settings_validation(slice.id(), reason))
}

/// Text setting value. Numbers and booleans are accepted as their text form.
pub fn text_value(key: &str, value: &Value) -> Result<String, PluginError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(PluginError::invalid_input(format!("{key} must be text"))),
    }
}

pub fn bool_value(key: &str, value: &Value) -> Result<bool, PluginError> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => match text.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(PluginError::invalid_input(format!("{key} must be true or false"))),
        },
        _ => Err(PluginError::invalid_input(format!("{key} must be true or false"))),
    }
}

/// Integer setting value. Strings are parsed after trimming.
pub fn int_value(key: &str, value: &Value) -> Result<i64, PluginError> {
    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| PluginError::invalid_input(format!("{key} must be an integer")))
}

/// Hand `task` to the host. A failure is noticed with `what` and logged.
pub fn spawn_reported<F>(app: &Arc<dyn App>, plugin: &'static str, what: String, task: F)
where
    F: Future<Output = Result<(), PluginError>> + Send + 'static,
{
    let reporter = Arc::clone(app);
    app.spawn(Box::pin(async move {
        if let Err(e) = task.await {
            tracing::error!(plugin, error = %e, "{}", what);
            reporter.notice(&format!("{ERROR_PREFIX} {what}: {e}"));
        }
    }));
}
