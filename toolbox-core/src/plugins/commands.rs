//! Host command table that sub-plugin commands are registered into

use std::collections::BTreeMap;

use toolbox_plugin_api::Command;

use crate::error::ToolboxError;

/// The host side of command registration.
///
/// Ids are namespaced (`<sub-plugin id>:<command id>`) before they get here.
pub trait CommandTable: Send + Sync {
    /// Register a command. Fails if the id is taken.
    fn add(&mut self, command: Command) -> Result<(), ToolboxError>;

    /// Remove a command, returning it if it was registered
    fn remove(&mut self, id: &str) -> Option<Command>;

    fn get(&self, id: &str) -> Option<&Command>;

    /// All registered ids, sorted
    fn ids(&self) -> Vec<String>;
}

/// In-memory command table
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Commands registered under a sub-plugin's namespace
    pub fn for_plugin(&self, plugin_id: &str) -> Vec<&Command> {
        let prefix = format!("{plugin_id}:");
        self.commands
            .iter()
            .filter(|(id, _)| id.starts_with(&prefix))
            .map(|(_, command)| command)
            .collect()
    }
}

impl CommandTable for CommandRegistry {
    fn add(&mut self, command: Command) -> Result<(), ToolboxError> {
        if self.commands.contains_key(&command.id) {
            return Err(ToolboxError::CommandConflict {
                command: command.id,
            });
        }
        self.commands.insert(command.id.clone(), command);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Option<Command> {
        self.commands.remove(id)
    }

    fn get(&self, id: &str) -> Option<&Command> {
        self.commands.get(id)
    }

    fn ids(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(id: &str) -> Command {
        Command::new(id, id, || Ok(()))
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = CommandRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.ids().is_empty());
    }

    #[test]
    fn test_add_and_get() {
        let mut registry = CommandRegistry::new();
        registry.add(command("random:generate")).unwrap();
        assert!(registry.get("random:generate").is_some());
        assert!(registry.get("generate").is_none());
    }

    #[test]
    fn test_add_conflict() {
        let mut registry = CommandRegistry::new();
        registry.add(command("a:x")).unwrap();
        let err = registry.add(command("a:x")).unwrap_err();
        assert!(matches!(err, ToolboxError::CommandConflict { command } if command == "a:x"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut registry = CommandRegistry::new();
        registry.add(command("a:x")).unwrap();
        assert!(registry.remove("a:x").is_some());
        assert!(registry.remove("a:x").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let mut registry = CommandRegistry::new();
        registry.add(command("b:y")).unwrap();
        registry.add(command("a:x")).unwrap();
        assert_eq!(registry.ids(), vec!["a:x".to_string(), "b:y".to_string()]);
    }

    #[test]
    fn test_for_plugin_matches_namespace_only() {
        let mut registry = CommandRegistry::new();
        registry.add(command("gyazo:upload")).unwrap();
        registry.add(command("gyazo:copy")).unwrap();
        registry.add(command("gyazo-extra:other")).unwrap();
        assert_eq!(registry.for_plugin("gyazo").len(), 2);
    }
}
