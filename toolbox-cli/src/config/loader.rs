use super::types::{DEFAULT_LOG_LEVEL, RawToolboxConfig, ToolboxConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ToolboxConfig> {
        Self::load_from(&[Self::user_config_path(), Self::project_config_path()])
    }

    /// Merge the given files in order; later files win, missing files are skipped
    pub fn load_from(paths: &[PathBuf]) -> Result<ToolboxConfig> {
        let mut raw = RawToolboxConfig::default();
        for path in paths {
            if let Some(layer) = Self::read_layer(path)? {
                raw = Self::merge_raw(raw, layer);
            }
        }
        Ok(Self::finalize(raw))
    }

    /// User config path, under the toolbox config directory
    pub fn user_config_path() -> PathBuf {
        toolbox_paths::config_path()
    }

    /// Project config path.
    /// Can be overridden with TOOLBOX_PROJECT_CONFIG_DIR.
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("TOOLBOX_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join(toolbox_paths::CONFIG_FILE)
        } else {
            PathBuf::from(".toolbox").join(toolbox_paths::CONFIG_FILE)
        }
    }

    fn read_layer(path: &Path) -> Result<Option<RawToolboxConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let layer = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Config layer loaded");
        Ok(Some(layer))
    }

    /// Overlay values override base only if explicitly set
    fn merge_raw(base: RawToolboxConfig, overlay: RawToolboxConfig) -> RawToolboxConfig {
        RawToolboxConfig {
            settings_path: overlay.settings_path.or(base.settings_path),
            vault_dir: overlay.vault_dir.or(base.vault_dir),
            new_file_folder: overlay.new_file_folder.or(base.new_file_folder),
            log_level: overlay.log_level.or(base.log_level),
        }
    }

    fn finalize(raw: RawToolboxConfig) -> ToolboxConfig {
        let defaults = ToolboxConfig::default();
        ToolboxConfig {
            settings_path: raw.settings_path.unwrap_or(defaults.settings_path),
            vault_dir: raw.vault_dir.unwrap_or(defaults.vault_dir),
            new_file_folder: raw.new_file_folder,
            log_level: raw
                .log_level
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }
}
