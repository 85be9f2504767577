//! Host collaborators exposed to sub-plugins
//!
//! The host application owns the window, the vault and the editor. Sub-plugins
//! see it only through these narrow traits. Everything beyond notices and the
//! clipboard is optional, so a headless host can implement just what it has.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::PluginError;

/// A note in the vault, addressed by its vault-relative path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NoteFile {
    pub path: String,
}

impl NoteFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// File name including extension
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without its extension
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(dot) if dot > 0 => &name[..dot],
            _ => name,
        }
    }
}

/// A file the user picked from outside the vault (e.g. for upload)
#[derive(Debug, Clone)]
pub struct ImportedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImportedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// One multipart form field
#[derive(Debug, Clone)]
pub enum FormValue {
    Text(String),
    File {
        file_name: String,
        mime_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: String,
    pub value: FormValue,
}

impl FormField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    pub fn file(name: impl Into<String>, file: &ImportedFile) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File {
                file_name: file.name.clone(),
                mime_type: file.mime_type.clone(),
                bytes: file.bytes.clone(),
            },
        }
    }

    /// Text value, if this is a text field
    pub fn as_text(&self) -> Option<&str> {
        match &self.value {
            FormValue::Text(text) => Some(text),
            FormValue::File { .. } => None,
        }
    }
}

/// Status and JSON body of an HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Value,
}

/// Work a command hands to the host to finish in the background
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// The host application handle passed to every sub-plugin
pub trait App: Send + Sync {
    /// Show a transient notice to the user
    fn notice(&self, message: &str);

    /// Replace the system clipboard contents
    fn write_clipboard(&self, text: &str) -> Result<(), PluginError>;

    /// Run `task` to completion without blocking the caller. Commands are
    /// synchronous, so vault and network work goes through here.
    fn spawn(&self, task: BackgroundTask);

    /// The note currently focused in the workspace
    fn active_file(&self) -> Option<NoteFile> {
        None
    }

    /// Wiki link text for `file`, resolved against the host's metadata
    fn wiki_link(&self, file: &NoteFile) -> String {
        format!("[[{}]]", file.basename())
    }

    /// The active markdown editor
    fn editor(&self) -> Option<Arc<dyn Editor>> {
        None
    }

    /// The note vault
    fn vault(&self) -> Option<Arc<dyn Vault>> {
        None
    }

    /// Outbound HTTP transport
    fn http(&self) -> Option<Arc<dyn HttpClient>> {
        None
    }

    /// Ask the user to pick files from disk
    fn pick_files(&self) -> Vec<ImportedFile> {
        Vec::new()
    }

    /// Ask the user for one line of text
    fn prompt(&self, _title: &str) -> Option<String> {
        None
    }
}

/// The active markdown editor
pub trait Editor: Send + Sync {
    fn selection(&self) -> String;

    fn replace_selection(&self, text: &str);
}

/// The note vault
#[async_trait]
pub trait Vault: Send + Sync {
    async fn read(&self, path: &str) -> Result<String, PluginError>;

    async fn create(&self, path: &str, content: &str) -> Result<NoteFile, PluginError>;

    fn file_exists(&self, path: &str) -> bool;

    /// Folder configured by the user for new notes
    fn new_file_folder(&self) -> Option<String> {
        None
    }

    /// Markdown link to `file`, honoring the user's link style
    fn markdown_link(&self, file: &NoteFile, alias: Option<&str>) -> String {
        match alias {
            Some(alias) => format!("[[{}|{}]]", file.basename(), alias),
            None => format!("[[{}]]", file.basename()),
        }
    }
}

/// Outbound HTTP transport
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST a multipart form and decode the JSON reply
    async fn post_form(&self, url: &str, fields: Vec<FormField>) -> Result<HttpReply, PluginError>;
}
