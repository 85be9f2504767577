//! toolbox-plugin-api - API for writing toolbox minimal plugins
//!
//! A minimal plugin adds one focused editing convenience to the note-taking
//! host. It registers commands during `on_load`, keeps its private settings in
//! a [`SettingsSlice`], and asks for persistence through the save-request bus
//! instead of touching storage itself.
//!
//! # Example
//!
//! ```ignore
//! use toolbox_plugin_api::{
//!     Command, MinimalPlugin, PluginContext, PluginError, SettingItem, SettingsContainer,
//! };
//!
//! #[derive(Default)]
//! pub struct Hello;
//!
//! impl MinimalPlugin for Hello {
//!     fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
//!         let app = ctx.app().clone();
//!         ctx.add_command(Command::new("say-hello", "Say hello", move || {
//!             app.notice("Hello!");
//!             Ok(())
//!         }))
//!     }
//!
//!     fn display_settings(&self, container: &mut SettingsContainer) {
//!         container.add(SettingItem::info("about", "Says hello"));
//!     }
//! }
//! ```

pub mod app;
pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod mock;
pub mod settings;
pub mod ui;

use serde_json::Value;

pub use app::{
    App, BackgroundTask, Editor, FormField, FormValue, HttpClient, HttpReply, ImportedFile,
    NoteFile, Vault,
};
pub use command::{CheckCallback, Command, CommandAction, CommandCallback};
pub use context::PluginContext;
pub use error::PluginError;
pub use event::{EVENT_SHOULD_SAVE, SaveRequestBus, Subscription};
pub use settings::{
    SettingsSlice, SharedSettings, SubPluginEntry, ToolboxSettings, read_settings, write_settings,
};
pub use ui::{SettingItem, SettingKind, SettingsContainer};

/// The contract every minimal plugin implements.
///
/// The lifecycle manager calls `on_load` exactly once after construction and
/// `on_unload` exactly once before the instance is dropped, even when
/// `on_load` failed part way.
pub trait MinimalPlugin: Send + Sync {
    /// Register commands and do one-time setup. Validate settings here and
    /// fail instead of running with corrupt state.
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError>;

    /// Release held resources
    fn on_unload(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Describe this sub-plugin's settings
    fn display_settings(&self, container: &mut SettingsContainer);

    /// A setting shown by `display_settings` was edited.
    ///
    /// Implementations update their in-memory settings, write them to the
    /// slice and request a save once.
    fn on_setting_changed(
        &mut self,
        key: &str,
        _value: &Value,
        _ctx: &mut PluginContext,
    ) -> Result<(), PluginError> {
        Err(PluginError::UnknownSetting(key.to_string()))
    }
}
