//! XDG Base Directory paths for toolbox.
//!
//! The settings document and the CLI configuration live under the same
//! config directory, mirroring how the note-taking host keeps one data file
//! per plugin.

use std::path::PathBuf;

/// File name of the persisted settings document.
pub const SETTINGS_FILE: &str = "data.json";

/// File name of the CLI configuration.
pub const CONFIG_FILE: &str = "config.toml";

/// Get the toolbox config directory.
///
/// Returns `$XDG_CONFIG_HOME/toolbox` if set, otherwise `~/.config/toolbox`.
///
/// # Examples
///
/// ```
/// use toolbox_paths::config_dir;
///
/// let config = config_dir();
/// let settings = config.join("data.json");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join("toolbox")
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config/toolbox")
    } else {
        PathBuf::from(".config/toolbox")
    }
}

/// Default location of the persisted settings document.
pub fn settings_path() -> PathBuf {
    config_dir().join(SETTINGS_FILE)
}

/// Default location of the CLI configuration file.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_toolbox() {
        let path = config_dir();
        assert!(
            path.ends_with("toolbox"),
            "config_dir should end with 'toolbox'"
        );
    }

    #[test]
    fn test_files_live_under_toolbox_dir() {
        assert!(settings_path().ends_with("toolbox/data.json"));
        assert!(config_path().ends_with("toolbox/config.toml"));
    }

    #[test]
    fn test_config_dir_respects_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
        }
        let path = config_dir();
        assert_eq!(path, PathBuf::from("/tmp/test-config/toolbox"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
        }
    }
}
