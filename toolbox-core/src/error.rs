//! Error types for toolbox-core

use std::path::PathBuf;

use thiserror::Error;
use toolbox_plugin_api::PluginError;

use crate::merge::MergeConflict;

/// Top-level error type for toolbox-core
#[derive(Error, Debug)]
pub enum ToolboxError {
    #[error("Settings merge failed: {0}")]
    Merge(#[from] MergeConflict),

    #[error("Invalid settings document: {0}")]
    InvalidDocument(#[source] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to enable '{id}': {source}")]
    EnableFailed {
        id: String,
        #[source]
        source: PluginError,
    },

    #[error("Command '{command}' is already registered")]
    CommandConflict { command: String },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command '{command}' failed: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: PluginError,
    },

    #[error("Sub-plugin '{0}' is not running")]
    NotRunning(String),

    #[error("Sub-plugin '{id}' failed: {source}")]
    Plugin {
        id: String,
        #[source]
        source: PluginError,
    },
}

/// Errors from the settings persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
