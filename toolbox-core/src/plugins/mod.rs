//! Minimal-plugin lifecycle management
//!
//! - [`Toolbox`]: constructs and destroys sub-plugin instances on
//!   enable/disable, forwards their commands to the host and persists
//!   settings when a save is requested
//! - [`Registry`]: the closed set of sub-plugins that can be enabled
//! - [`CommandTable`]: the host command system commands are forwarded to
//!
//! # Example
//!
//! ```ignore
//! use toolbox_core::plugins::Toolbox;
//! use toolbox_core::storage::JsonFileStorage;
//!
//! let mut toolbox = Toolbox::new(app, registry, Arc::new(JsonFileStorage::at_default_location()));
//! toolbox.load_settings().await?;
//! toolbox.load_all_enabled();
//!
//! toolbox.set_sub_plugin_enabled("random", true)?;
//! toolbox.process_save_requests().await;
//! ```

mod commands;
mod host;
mod registry;

pub use commands::{CommandRegistry, CommandTable};
pub use host::{LoadReport, SubPluginInfo, Toolbox};
pub use registry::{PluginConstructor, Registry, RegistryEntry};
