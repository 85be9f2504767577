//! Error types for sub-plugin authors

use thiserror::Error;

/// Errors that sub-plugins can return
#[derive(Error, Debug)]
pub enum PluginError {
    /// Persisted settings data does not match the sub-plugin's expected shape
    #[error("Invalid settings for '{plugin}': {reason}")]
    SettingsValidation { plugin: String, reason: String },

    /// Duplicate command registration within one sub-plugin
    #[error("Duplicate command: {0}")]
    DuplicateCommand(String),

    /// Setting key the sub-plugin does not expose
    #[error("Unknown setting: {0}")]
    UnknownSetting(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Host capability not available
    #[error("Not supported by host: {0}")]
    Unsupported(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote upload failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Custom error with message
    #[error("{0}")]
    Custom(String),
}

impl PluginError {
    /// Create a custom error with a message
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a settings validation error
    pub fn settings_validation(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SettingsValidation {
            plugin: plugin.into(),
            reason: reason.into(),
        }
    }

    /// Create an unsupported-capability error
    pub fn unsupported(capability: impl Into<String>) -> Self {
        Self::Unsupported(capability.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PluginError::settings_validation("random", "strLength must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid settings for 'random': strLength must be a number"
        );

        let custom_err = PluginError::Custom("something happened".to_string());
        assert_eq!(custom_err.to_string(), "something happened");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let plugin_err: PluginError = io_err.into();

        assert!(matches!(plugin_err, PluginError::Io(_)));
        assert!(plugin_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PluginError = json_err.into();
        assert!(matches!(err, PluginError::Json(_)));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(PluginError::custom("x"), PluginError::Custom(_)));
        assert!(matches!(
            PluginError::invalid_input("x"),
            PluginError::InvalidInput(_)
        ));
        assert!(matches!(
            PluginError::unsupported("clipboard"),
            PluginError::Unsupported(_)
        ));
    }

    #[test]
    fn test_duplicate_command_error() {
        let err = PluginError::DuplicateCommand("copy-wiki-link".into());
        assert!(err.to_string().contains("copy-wiki-link"));
    }
}
