//! PluginContext - the base every sub-plugin is built on
//!
//! One context is created per running sub-plugin instance. It carries the
//! host handle, the instance's settings slice and the shared save-request
//! bus, and it keeps the list of commands the instance registered.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::app::App;
use crate::command::Command;
use crate::error::PluginError;
use crate::event::SaveRequestBus;
use crate::settings::SettingsSlice;

pub struct PluginContext {
    id: String,
    app: Arc<dyn App>,
    settings: SettingsSlice,
    events: SaveRequestBus,
    /// Commands registered by this instance, in registration order
    commands: Vec<Command>,
}

impl PluginContext {
    /// Create a context for sub-plugin `id`
    pub fn new(
        id: impl Into<String>,
        app: Arc<dyn App>,
        settings: SettingsSlice,
        events: SaveRequestBus,
    ) -> Self {
        Self {
            id: id.into(),
            app,
            settings,
            events,
            commands: Vec::new(),
        }
    }

    /// Registry id of the owning sub-plugin
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The host application handle
    pub fn app(&self) -> &Arc<dyn App> {
        &self.app
    }

    /// This instance's settings slice
    pub fn settings(&self) -> &SettingsSlice {
        &self.settings
    }

    // ─── Commands ────────────────────────────────────────────────────

    /// Append a command. Registration with the host is done by the
    /// lifecycle manager after `on_load` returns.
    pub fn add_command(&mut self, command: Command) -> Result<(), PluginError> {
        if self.commands.iter().any(|c| c.id == command.id) {
            return Err(PluginError::DuplicateCommand(command.id));
        }
        self.commands.push(command);
        Ok(())
    }

    /// Every command added so far, in registration order
    pub fn list_commands(&self) -> &[Command] {
        &self.commands
    }

    // ─── Settings ────────────────────────────────────────────────────

    /// Ask the lifecycle manager to persist settings. Does not block.
    pub fn request_save_settings(&self) {
        tracing::debug!(plugin = %self.id, "Save requested");
        self.events.trigger();
    }

    /// Handle for commands that need to request a save after `on_load`
    pub fn save_requester(&self) -> SaveRequestBus {
        self.events.clone()
    }

    /// Validate the settings data and return it typed.
    ///
    /// Absent data or a validator rejection is a
    /// [`PluginError::SettingsValidation`]; there is no silent fallback.
    pub fn load_settings<T, F>(&self, validator: F) -> Result<T, PluginError>
    where
        F: FnOnce(&Value) -> Result<T, String>,
    {
        let data = self
            .settings
            .get()
            .ok_or_else(|| PluginError::settings_validation(&self.id, "settings data is missing"))?;
        validator(&data).map_err(|reason| PluginError::settings_validation(&self.id, reason))
    }

    /// Write `settings` into the slice, then request one save
    pub fn store_settings<T: Serialize>(&self, settings: &T) -> Result<(), PluginError> {
        self.settings.set(serde_json::to_value(settings)?)?;
        self.request_save_settings();
        Ok(())
    }

    // ─── Logging ─────────────────────────────────────────────────────

    /// Log an info message (automatically tagged with the sub-plugin id)
    pub fn log_info(&self, message: &str) {
        tracing::info!(plugin = %self.id, "{}", message);
    }

    /// Log a warning message
    pub fn log_warn(&self, message: &str) {
        tracing::warn!(plugin = %self.id, "{}", message);
    }

    /// Log an error message
    pub fn log_error(&self, message: &str) {
        tracing::error!(plugin = %self.id, "{}", message);
    }

    /// Log a debug message
    pub fn log_debug(&self, message: &str) {
        tracing::debug!(plugin = %self.id, "{}", message);
    }
}
