//! Toolbox - manages the minimal-plugin lifecycle and settings persistence

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use toolbox_plugin_api::{
    App, MinimalPlugin, PluginContext, PluginError, SaveRequestBus, SettingsContainer,
    SettingsSlice, SharedSettings, Subscription, ToolboxSettings, read_settings, write_settings,
};

use super::commands::{CommandRegistry, CommandTable};
use super::registry::Registry;
use crate::error::ToolboxError;
use crate::settings::{default_settings, merge_with_defaults};
use crate::storage::SettingsStorage;

/// A running sub-plugin instance
struct LoadedPlugin {
    id: String,
    instance: Box<dyn MinimalPlugin>,
    context: PluginContext,
}

impl LoadedPlugin {
    /// Host-side ids of every command the instance reported
    fn command_ids(&self) -> Vec<String> {
        self.context
            .list_commands()
            .iter()
            .map(|command| command.namespaced(&self.id).id)
            .collect()
    }
}

impl Drop for LoadedPlugin {
    fn drop(&mut self) {
        if let Err(e) = self.instance.on_unload() {
            tracing::warn!(
                plugin = %self.id,
                error = %e,
                "Sub-plugin on_unload returned error"
            );
        }
    }
}

/// Status of one registered sub-plugin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubPluginInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Persisted `on` flag
    pub enabled: bool,
    /// Whether an instance is currently loaded
    pub running: bool,
}

/// Outcome of [`Toolbox::load_all_enabled`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub enabled: Vec<String>,
    pub failed: Vec<String>,
}

/// The top-level plugin: owns the settings store, the running sub-plugin
/// instances and the host command table.
///
/// Every mutating operation takes `&mut self`, so two lifecycle
/// transitions can never interleave.
pub struct Toolbox {
    app: Arc<dyn App>,
    registry: Arc<Registry>,
    settings: SharedSettings,
    events: SaveRequestBus,
    storage: Arc<dyn SettingsStorage>,
    commands: Box<dyn CommandTable>,
    /// Running instances by sub-plugin id
    plugins: HashMap<String, LoadedPlugin>,
    save_requests: mpsc::UnboundedReceiver<()>,
    _save_subscription: Subscription,
}

impl Toolbox {
    /// Create a toolbox with default settings and an in-memory command table
    pub fn new(
        app: Arc<dyn App>,
        registry: Arc<Registry>,
        storage: Arc<dyn SettingsStorage>,
    ) -> Self {
        let settings = Arc::new(RwLock::new(default_settings(&registry)));
        let events = SaveRequestBus::new();
        let (tx, save_requests) = mpsc::unbounded_channel();
        let subscription = events.on(move || {
            if tx.send(()).is_err() {
                tracing::debug!("Save request dropped, toolbox is shutting down");
            }
        });

        Self {
            app,
            registry,
            settings,
            events,
            storage,
            commands: Box::new(CommandRegistry::new()),
            plugins: HashMap::new(),
            save_requests,
            _save_subscription: subscription,
        }
    }

    /// Register commands into a host-provided table instead
    pub fn with_command_table(mut self, commands: Box<dyn CommandTable>) -> Self {
        self.commands = commands;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Snapshot of the whole settings store
    pub fn settings(&self) -> ToolboxSettings {
        read_settings(&self.settings).clone()
    }

    pub fn shared_settings(&self) -> &SharedSettings {
        &self.settings
    }

    /// The save-request bus handed to every sub-plugin
    pub fn events(&self) -> &SaveRequestBus {
        &self.events
    }

    pub fn commands(&self) -> &dyn CommandTable {
        self.commands.as_ref()
    }

    pub fn is_running(&self, id: &str) -> bool {
        self.plugins.contains_key(id)
    }

    pub fn running_count(&self) -> usize {
        self.plugins.len()
    }

    // ─── Settings persistence ────────────────────────────────────────

    /// Load the persisted document and merge it onto fresh defaults.
    ///
    /// On failure the current store is left untouched.
    pub async fn load_settings(&mut self) -> Result<(), ToolboxError> {
        let persisted = match self.storage.load().await {
            Ok(persisted) => persisted,
            Err(e) => return Err(self.report("Failed to load settings", e.into())),
        };

        let merged = match merge_with_defaults(&self.registry, persisted.as_ref()) {
            Ok(merged) => merged,
            Err(e) => return Err(self.report("Failed to load settings", e)),
        };

        *write_settings(&self.settings) = merged;
        tracing::debug!(
            sub_plugins = self.registry.len(),
            first_run = persisted.is_none(),
            "Settings loaded"
        );
        Ok(())
    }

    /// Write the whole settings store to storage.
    ///
    /// A failed save is reported; in-memory settings are kept as they are.
    pub async fn save_settings(&self) -> Result<(), ToolboxError> {
        let document = read_settings(&self.settings)
            .to_value()
            .map_err(ToolboxError::InvalidDocument)?;

        if let Err(e) = self.storage.save(&document).await {
            return Err(self.report("Failed to save settings", e.into()));
        }
        tracing::debug!("Settings saved");
        Ok(())
    }

    /// Perform one save for every pending save request
    pub async fn process_save_requests(&mut self) -> usize {
        let mut saves = 0;
        while self.save_requests.try_recv().is_ok() {
            // Failures are already reported by save_settings
            self.save_settings().await.ok();
            saves += 1;
        }
        saves
    }

    /// Wait until a save is requested. Returns `false` once no more
    /// requests can arrive.
    pub async fn next_save_request(&mut self) -> bool {
        self.save_requests.recv().await.is_some()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────

    /// Construct and load a sub-plugin, then register its commands.
    ///
    /// Unknown ids are ignored. A running instance is disabled first. If
    /// `on_load` fails nothing is registered and the error is reported.
    pub fn enable_sub_plugin(&mut self, id: &str) -> Result<(), ToolboxError> {
        let registry = Arc::clone(&self.registry);
        let Some(entry) = registry.get(id) else {
            tracing::debug!(plugin = %id, "Unknown sub-plugin, ignoring enable");
            return Ok(());
        };

        if self.plugins.contains_key(id) {
            self.disable_sub_plugin(id);
        }

        if let Some(defaults) = entry.default_data() {
            let mut settings = write_settings(&self.settings);
            let slot = settings.minimal_plugins.entry(id.to_string()).or_default();
            if slot.data.is_none() {
                slot.data = Some(defaults.clone());
            }
        }

        let context = PluginContext::new(
            id,
            Arc::clone(&self.app),
            SettingsSlice::new(&self.settings, id),
            self.events.clone(),
        );
        let mut loaded = LoadedPlugin {
            id: id.to_string(),
            instance: entry.construct(),
            context,
        };

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            loaded.instance.on_load(&mut loaded.context)
        }));
        let result = match outcome {
            Ok(result) => result,
            Err(_) => Err(PluginError::custom("panicked in on_load")),
        };
        if let Err(source) = result {
            let err = ToolboxError::EnableFailed {
                id: id.to_string(),
                source,
            };
            return Err(self.report(&format!("Failed to enable {}", entry.name), err));
        }

        let mut registered: Vec<String> = Vec::new();
        for command in loaded.context.list_commands() {
            let command = command.namespaced(id);
            let command_id = command.id.clone();
            if let Err(e) = self.commands.add(command) {
                for done in &registered {
                    self.commands.remove(done);
                }
                return Err(self.report(&format!("Failed to enable {}", entry.name), e));
            }
            registered.push(command_id);
        }

        tracing::info!(
            plugin = %id,
            commands = registered.len(),
            "Sub-plugin enabled"
        );
        self.plugins.insert(id.to_string(), loaded);
        Ok(())
    }

    /// Deregister a running sub-plugin's commands and unload it.
    ///
    /// Returns `false` if nothing was running for `id`.
    pub fn disable_sub_plugin(&mut self, id: &str) -> bool {
        let Some(loaded) = self.plugins.remove(id) else {
            tracing::debug!(plugin = %id, "Sub-plugin not running, nothing to disable");
            return false;
        };

        for command_id in loaded.command_ids() {
            self.commands.remove(&command_id);
        }
        drop(loaded);

        tracing::info!(plugin = %id, "Sub-plugin disabled");
        true
    }

    /// Enable every sub-plugin whose persisted flag is on. Failures are
    /// reported, their flag is cleared and one save is requested.
    pub fn load_all_enabled(&mut self) -> LoadReport {
        let ids: Vec<String> = read_settings(&self.settings)
            .minimal_plugins
            .iter()
            .filter(|(_, entry)| entry.on)
            .map(|(id, _)| id.clone())
            .collect();

        let mut report = LoadReport::default();
        for id in ids {
            if !self.registry.contains(&id) {
                tracing::debug!(plugin = %id, "Stale sub-plugin id in settings, skipping");
                continue;
            }
            match self.enable_sub_plugin(&id) {
                Ok(()) => report.enabled.push(id),
                Err(_) => report.failed.push(id),
            }
        }

        if !report.failed.is_empty() {
            let mut settings = write_settings(&self.settings);
            for id in &report.failed {
                settings.set_enabled(id, false);
            }
            drop(settings);
            self.events.trigger();
        }
        report
    }

    /// The settings toggle: flip the `on` flag, enable or disable, and
    /// request one save. A failed enable leaves the flag off.
    pub fn set_sub_plugin_enabled(&mut self, id: &str, on: bool) -> Result<(), ToolboxError> {
        if !self.registry.contains(id) {
            tracing::debug!(plugin = %id, "Unknown sub-plugin, ignoring toggle");
            return Ok(());
        }

        let result = if on {
            self.enable_sub_plugin(id)
        } else {
            self.disable_sub_plugin(id);
            Ok(())
        };

        write_settings(&self.settings).set_enabled(id, on && result.is_ok());
        self.events.trigger();
        result
    }

    /// Disable every running sub-plugin
    pub fn unload_all(&mut self) {
        let ids: Vec<String> = self.plugins.keys().cloned().collect();
        for id in ids {
            self.disable_sub_plugin(&id);
        }
    }

    // ─── Commands ────────────────────────────────────────────────────

    /// Run a registered command. Returns `false` when a conditional
    /// command did not apply.
    pub fn execute_command(&self, id: &str) -> Result<bool, ToolboxError> {
        let command = self
            .commands
            .get(id)
            .cloned()
            .ok_or_else(|| ToolboxError::UnknownCommand(id.to_string()))?;

        command.run().map_err(|source| {
            let err = ToolboxError::CommandFailed {
                command: id.to_string(),
                source,
            };
            self.report(&command.name, err)
        })
    }

    /// Whether a command can run right now, without side effects
    pub fn command_applicable(&self, id: &str) -> bool {
        self.commands
            .get(id)
            .is_some_and(|command| command.is_applicable())
    }

    // ─── Settings surface ────────────────────────────────────────────

    pub fn sub_plugins(&self) -> Vec<SubPluginInfo> {
        let settings = read_settings(&self.settings);
        self.registry
            .iter()
            .map(|entry| SubPluginInfo {
                id: entry.id.clone(),
                name: entry.name.clone(),
                description: entry.description.clone(),
                enabled: settings.is_enabled(&entry.id),
                running: self.plugins.contains_key(&entry.id),
            })
            .collect()
    }

    /// Settings items of a running sub-plugin
    pub fn display_settings(&self, id: &str) -> Result<SettingsContainer, ToolboxError> {
        let loaded = self
            .plugins
            .get(id)
            .ok_or_else(|| ToolboxError::NotRunning(id.to_string()))?;
        let mut container = SettingsContainer::new();
        loaded.instance.display_settings(&mut container);
        Ok(container)
    }

    /// Forward a settings edit to a running sub-plugin
    pub fn update_setting(
        &mut self,
        id: &str,
        key: &str,
        value: &Value,
    ) -> Result<(), ToolboxError> {
        let Some(loaded) = self.plugins.get_mut(id) else {
            return Err(ToolboxError::NotRunning(id.to_string()));
        };

        let result = loaded
            .instance
            .on_setting_changed(key, value, &mut loaded.context);
        result.map_err(|source| {
            let err = ToolboxError::Plugin {
                id: id.to_string(),
                source,
            };
            self.report(&format!("Failed to update {key}"), err)
        })
    }

    /// Surface an error to the user and the log, then hand it back
    fn report(&self, what: &str, err: ToolboxError) -> ToolboxError {
        tracing::error!(error = %err, "{}", what);
        self.app.notice(&format!("{what}: {err}"));
        err
    }
}

impl Drop for Toolbox {
    fn drop(&mut self) {
        self.unload_all();
    }
}
