//! Note refactor: extract the editor selection into a new note

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use toolbox_plugin_api::{
    App, Command, Editor, MinimalPlugin, NoteFile, PluginContext, PluginError, SettingItem,
    SettingsContainer, Vault,
};

use crate::shared::{decode, read_slice, spawn_reported, text_value};

pub const ID: &str = "note-refactor";

const DEFAULT_TEMPLATE: &str = "{{content}}";
const CONTENT_PLACEHOLDER: &str = "{{content}}";
const HEADING_PATTERN: &str = r"# +(\S+)";

/// moment-style tokens, longest first, and their strftime equivalents
const DATE_TOKENS: [(&str, &str); 7] = [
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRefactorSettings {
    pub template_path: String,
    #[serde(default)]
    pub new_file_folder_path: String,
    pub file_name_format: String,
}

impl Default for NoteRefactorSettings {
    fn default() -> Self {
        Self {
            template_path: String::new(),
            new_file_folder_path: "/".to_string(),
            file_name_format: "YYMMDD-HHmmss".to_string(),
        }
    }
}

pub fn default_data() -> Value {
    json!({
        "templatePath": "",
        "newFileFolderPath": "/",
        "fileNameFormat": "YYMMDD-HHmmss"
    })
}

pub fn validate(value: &Value) -> Result<NoteRefactorSettings, String> {
    decode(value)
}

/// Format `at` with a moment-style pattern (`YYYY YY MM DD HH mm ss`).
///
/// Text inside `[...]` is copied literally; any other character is kept.
pub fn format_file_name(format: &str, at: &NaiveDateTime) -> String {
    let mut pattern = String::with_capacity(format.len());
    let mut rest = format;
    while let Some(c) = rest.chars().next() {
        if c == '[' {
            if let Some(end) = rest.find(']') {
                push_literal(&mut pattern, &rest[1..end]);
                rest = &rest[end + 1..];
                continue;
            }
        }
        if let Some((token, spec)) = DATE_TOKENS.iter().find(|(token, _)| rest.starts_with(token)) {
            pattern.push_str(spec);
            rest = &rest[token.len()..];
            continue;
        }
        push_literal(&mut pattern, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }
    at.format(&pattern).to_string()
}

fn push_literal(pattern: &mut String, text: &str) {
    for c in text.chars() {
        if c == '%' {
            pattern.push_str("%%");
        } else {
            pattern.push(c);
        }
    }
}

/// First word of the first `#` heading in `content`
pub fn first_heading<'a>(heading: &Regex, content: &'a str) -> Option<&'a str> {
    heading
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|word| word.as_str())
}

/// Vault path of the new note. Root folders collapse to a bare file name.
pub fn new_file_path(folder: &str, file_name: &str) -> String {
    let folder = folder.trim_matches('/');
    if folder.is_empty() {
        format!("{file_name}.md")
    } else {
        format!("{folder}/{file_name}.md")
    }
}

struct Extraction {
    app: Arc<dyn App>,
    editor: Arc<dyn Editor>,
    vault: Arc<dyn Vault>,
    settings: NoteRefactorSettings,
    heading: Regex,
    selection: String,
    now: NaiveDateTime,
}

impl Extraction {
    async fn run(self) -> Result<NoteFile, PluginError> {
        let template = self.read_template().await?;
        let content = template.replace(CONTENT_PLACEHOLDER, &self.selection);

        let folder = if self.settings.new_file_folder_path.is_empty() {
            self.vault.new_file_folder().unwrap_or_default()
        } else {
            self.settings.new_file_folder_path.clone()
        };
        let file_name = format_file_name(&self.settings.file_name_format, &self.now);
        let file = self
            .vault
            .create(&new_file_path(&folder, &file_name), &content)
            .await?;

        let alias = first_heading(&self.heading, &content);
        self.editor
            .replace_selection(&self.vault.markdown_link(&file, alias));
        tracing::info!(plugin = ID, path = %file.path, "Extracted selection");
        Ok(file)
    }

    async fn read_template(&self) -> Result<String, PluginError> {
        let path = &self.settings.template_path;
        if path.is_empty() {
            return Ok(DEFAULT_TEMPLATE.to_string());
        }
        if !self.vault.file_exists(path) {
            self.app.notice(&format!(
                "{} failed to read template from path: {path}",
                crate::shared::ERROR_PREFIX
            ));
            return Err(PluginError::custom(format!("template not found: {path}")));
        }
        self.vault.read(path).await
    }
}

#[derive(Debug, Default)]
pub struct NoteRefactor {
    settings: NoteRefactorSettings,
}

impl MinimalPlugin for NoteRefactor {
    fn on_load(&mut self, ctx: &mut PluginContext) -> Result<(), PluginError> {
        self.settings = ctx.load_settings(validate)?;
        let heading = Regex::new(HEADING_PATTERN)
            .map_err(|e| PluginError::custom(format!("invalid heading pattern: {e}")))?;

        let app = ctx.app().clone();
        let slice = ctx.settings().clone();
        ctx.add_command(Command::with_check(
            "split-file",
            "Extract current selection",
            move |checking| {
                let Some(editor) = app.editor() else {
                    return Ok(false);
                };
                let selection = editor.selection();
                if selection.is_empty() {
                    return Ok(false);
                }
                if checking {
                    return Ok(true);
                }

                let vault = app.vault().ok_or_else(|| PluginError::unsupported("vault"))?;
                let extraction = Extraction {
                    app: Arc::clone(&app),
                    editor,
                    vault,
                    settings: read_slice(&slice, validate)?,
                    heading: heading.clone(),
                    selection,
                    now: Local::now().naive_local(),
                };
                spawn_reported(&app, ID, "failed to extract selection".to_string(), async move {
                    extraction.run().await.map(|_| ())
                });
                Ok(true)
            },
        ))?;
        ctx.log_debug("NoteRefactor loaded");
        Ok(())
    }

    fn display_settings(&self, container: &mut SettingsContainer) {
        container
            .add(SettingItem::text(
                "templatePath",
                "Template file location",
                &self.settings.template_path,
            ))
            .add(SettingItem::text(
                "newFileFolderPath",
                "Default location for new notes",
                &self.settings.new_file_folder_path,
            ))
            .add(
                SettingItem::text(
                    "fileNameFormat",
                    "File name format",
                    &self.settings.file_name_format,
                )
                .with_description("Tokens: YYYY YY MM DD HH mm ss; [text] is literal"),
            );
    }

    fn on_setting_changed(
        &mut self,
        key: &str,
        value: &Value,
        ctx: &mut PluginContext,
    ) -> Result<(), PluginError> {
        let mut next = self.settings.clone();
        match key {
            "templatePath" => next.template_path = text_value(key, value)?,
            "newFileFolderPath" => next.new_file_folder_path = text_value(key, value)?,
            "fileNameFormat" => next.file_name_format = text_value(key, value)?,
            _ => return Err(PluginError::UnknownSetting(key.to_string())),
        }

        ctx.store_settings(&next)?;
        self.settings = next;
        Ok(())
    }
}
