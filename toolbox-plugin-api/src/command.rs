//! Command records that sub-plugins register with the host

use std::fmt;
use std::sync::Arc;

use crate::error::PluginError;

/// Unconditional command handler
pub type CommandCallback = Arc<dyn Fn() -> Result<(), PluginError> + Send + Sync>;

/// Conditional handler. Called with `checking = true` it must only report
/// whether the command applies right now; with `checking = false` it runs.
pub type CheckCallback = Arc<dyn Fn(bool) -> Result<bool, PluginError> + Send + Sync>;

/// How a command is executed
#[derive(Clone)]
pub enum CommandAction {
    /// Always applicable
    Callback(CommandCallback),
    /// Applicability is queried first, then the same closure runs for effect
    Check(CheckCallback),
}

/// A command as shown in the host's command palette
#[derive(Clone)]
pub struct Command {
    /// Stable id, unique within the owning sub-plugin
    pub id: String,
    /// Display name
    pub name: String,
    /// Handler
    pub action: CommandAction,
}

impl Command {
    /// Create an unconditional command
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn() -> Result<(), PluginError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            action: CommandAction::Callback(Arc::new(callback)),
        }
    }

    /// Create a conditional command
    pub fn with_check<F>(id: impl Into<String>, name: impl Into<String>, check: F) -> Self
    where
        F: Fn(bool) -> Result<bool, PluginError> + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            action: CommandAction::Check(Arc::new(check)),
        }
    }

    /// Whether the command can run right now. Side-effect free.
    pub fn is_applicable(&self) -> bool {
        match &self.action {
            CommandAction::Callback(_) => true,
            CommandAction::Check(check) => match check(true) {
                Ok(applicable) => applicable,
                Err(e) => {
                    tracing::warn!(command = %self.id, error = %e, "Command check failed");
                    false
                }
            },
        }
    }

    /// Run the command.
    ///
    /// Returns `Ok(false)` when a conditional command declined to run.
    pub fn run(&self) -> Result<bool, PluginError> {
        match &self.action {
            CommandAction::Callback(callback) => callback().map(|()| true),
            CommandAction::Check(check) => check(false),
        }
    }

    /// Copy of this command with its id prefixed by `namespace`
    pub fn namespaced(&self, namespace: &str) -> Self {
        Self {
            id: format!("{}:{}", namespace, self.id),
            name: self.name.clone(),
            action: self.action.clone(),
        }
    }

    /// Whether this is a conditional command
    pub fn is_conditional(&self) -> bool {
        matches!(self.action, CommandAction::Check(_))
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("conditional", &self.is_conditional())
            .finish()
    }
}
