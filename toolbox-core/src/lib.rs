//! toolbox-core: lifecycle and settings core for toolbox minimal plugins
//!
//! - **Deep merge** - [`merge::deep_merge`] merges persisted settings onto
//!   generated defaults
//! - **Settings** - [`settings::default_settings`] and
//!   [`settings::merge_with_defaults`] build the settings store
//! - **Storage** - [`SettingsStorage`] with [`JsonFileStorage`] and
//!   [`MemoryStorage`]
//! - **Lifecycle** - [`Toolbox`] enables and disables sub-plugins from a
//!   static [`Registry`]

pub mod error;
pub mod merge;
pub mod plugins;
pub mod settings;
pub mod storage;

pub use error::{StorageError, ToolboxError};
pub use merge::{MergeConflict, deep_clone, deep_merge};
pub use plugins::{
    CommandRegistry, CommandTable, LoadReport, PluginConstructor, Registry, RegistryEntry,
    SubPluginInfo, Toolbox,
};
pub use settings::{default_settings, merge_with_defaults};
pub use storage::{JsonFileStorage, MemoryStorage, SettingsStorage};
