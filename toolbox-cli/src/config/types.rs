use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration as stored in TOML files (optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawToolboxConfig {
    /// Settings document location
    pub settings_path: Option<PathBuf>,

    /// Directory treated as the note vault
    pub vault_dir: Option<PathBuf>,

    /// Folder inside the vault for new notes
    pub new_file_folder: Option<String>,

    /// Default tracing filter
    pub log_level: Option<String>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolboxConfig {
    pub settings_path: PathBuf,
    pub vault_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_file_folder: Option<String>,
    pub log_level: String,
}

impl Default for ToolboxConfig {
    fn default() -> Self {
        Self {
            settings_path: toolbox_paths::settings_path(),
            vault_dir: PathBuf::from("."),
            new_file_folder: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

pub const DEFAULT_LOG_LEVEL: &str = "info";
