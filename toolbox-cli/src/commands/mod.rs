//! Subcommands and the session they share

pub mod command;
pub mod config;
pub mod plugin;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use toolbox_core::{JsonFileStorage, SettingsStorage, Toolbox};
use toolbox_plugin_api::App;

use crate::config::ToolboxConfig;
use crate::terminal::{FsVault, ReqwestClient, TerminalApp};

/// A loaded toolbox with every enabled sub-plugin running
pub struct Session {
    pub toolbox: Toolbox,
    pub app: Arc<TerminalApp>,
}

impl Session {
    /// Load settings from `settings_path` and enable what they say is on
    pub async fn open(settings_path: PathBuf, app: TerminalApp) -> Result<Self> {
        let app = Arc::new(app);
        let storage = JsonFileStorage::new(settings_path);
        let mut toolbox = Toolbox::new(
            Arc::clone(&app) as Arc<dyn App>,
            toolbox_minimal_plugins::registry(),
            Arc::new(storage) as Arc<dyn SettingsStorage>,
        );
        toolbox.load_settings().await?;

        let report = toolbox.load_all_enabled();
        tracing::debug!(
            enabled = report.enabled.len(),
            failed = report.failed.len(),
            "Sub-plugins loaded"
        );
        Ok(Self { toolbox, app })
    }

    /// Wait for background work, then write every requested save
    pub async fn close(mut self) -> usize {
        let tasks = self.app.join_tasks().await;
        let saves = self.toolbox.process_save_requests().await;
        tracing::debug!(tasks, saves, "Session closed");
        saves
    }
}

/// Terminal app with the vault and HTTP transport from `config`
pub fn terminal_app(config: &ToolboxConfig) -> TerminalApp {
    let vault =
        FsVault::new(&config.vault_dir).with_new_file_folder(config.new_file_folder.clone());
    let app = TerminalApp::new().with_vault(vault);
    match ReqwestClient::new() {
        Ok(http) => app.with_http(http),
        Err(e) => {
            tracing::warn!(error = %e, "HTTP client unavailable, uploads are disabled");
            app
        }
    }
}
