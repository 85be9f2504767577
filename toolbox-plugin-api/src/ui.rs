//! Declarative settings surface
//!
//! Sub-plugins describe their settings as a list of items; the host decides
//! how to render them and reports edits back through
//! [`crate::MinimalPlugin::on_setting_changed`].

use serde::Serialize;

/// Kind and current value of one setting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SettingKind {
    Text { value: String },
    Number { value: i64 },
    Toggle { value: bool },
    /// Write-only field: the current value is never shown
    Secret { is_set: bool },
    /// Static text with no editable value
    Info,
}

/// One row of a sub-plugin's settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingItem {
    /// Key passed back to `on_setting_changed`
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub kind: SettingKind,
}

impl SettingItem {
    pub fn text(key: &str, name: &str, value: impl Into<String>) -> Self {
        Self::new(key, name, SettingKind::Text { value: value.into() })
    }

    pub fn number(key: &str, name: &str, value: i64) -> Self {
        Self::new(key, name, SettingKind::Number { value })
    }

    pub fn toggle(key: &str, name: &str, value: bool) -> Self {
        Self::new(key, name, SettingKind::Toggle { value })
    }

    pub fn secret(key: &str, name: &str, is_set: bool) -> Self {
        Self::new(key, name, SettingKind::Secret { is_set })
    }

    pub fn info(key: &str, name: &str) -> Self {
        Self::new(key, name, SettingKind::Info)
    }

    /// Builder: attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn new(key: &str, name: &str, kind: SettingKind) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            description: None,
            kind,
        }
    }
}

/// Container a sub-plugin renders its settings into
#[derive(Debug, Default, Clone, Serialize)]
pub struct SettingsContainer {
    items: Vec<SettingItem>,
}

impl SettingsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: SettingItem) -> &mut Self {
        self.items.push(item);
        self
    }

    pub fn items(&self) -> &[SettingItem] {
        &self.items
    }

    pub fn get(&self, key: &str) -> Option<&SettingItem> {
        self.items.iter().find(|item| item.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
