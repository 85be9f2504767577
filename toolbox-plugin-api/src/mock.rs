//! In-memory host for tests and headless runs
//!
//! [`MockApp`] records notices and clipboard writes so assertions can be made
//! about what a sub-plugin showed the user. Editor, vault and HTTP transport
//! are opt-in through the builder methods.

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::app::{
    App, BackgroundTask, Editor, FormField, HttpClient, HttpReply, ImportedFile, NoteFile, Vault,
};
use crate::error::PluginError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Recording implementation of [`App`]
#[derive(Default)]
pub struct MockApp {
    notices: Mutex<Vec<String>>,
    clipboard: Mutex<Vec<String>>,
    active_file: Mutex<Option<NoteFile>>,
    picked_files: Mutex<Vec<ImportedFile>>,
    prompt_answer: Mutex<Option<String>>,
    tasks: Mutex<Vec<BackgroundTask>>,
    editor: Option<Arc<MockEditor>>,
    vault: Option<Arc<MemoryVault>>,
    http: Option<Arc<MockHttpClient>>,
}

impl MockApp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: attach an editor
    pub fn with_editor(mut self, editor: Arc<MockEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    /// Builder: attach a vault
    pub fn with_vault(mut self, vault: Arc<MemoryVault>) -> Self {
        self.vault = Some(vault);
        self
    }

    /// Builder: attach an HTTP transport
    pub fn with_http(mut self, http: Arc<MockHttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn set_active_file(&self, file: Option<NoteFile>) {
        *lock(&self.active_file) = file;
    }

    /// Files returned by the next [`App::pick_files`]
    pub fn set_picked_files(&self, files: Vec<ImportedFile>) {
        *lock(&self.picked_files) = files;
    }

    pub fn set_prompt_answer(&self, answer: Option<String>) {
        *lock(&self.prompt_answer) = answer;
    }

    /// Every notice shown so far
    pub fn notices(&self) -> Vec<String> {
        lock(&self.notices).clone()
    }

    /// Every clipboard write so far
    pub fn clipboard_history(&self) -> Vec<String> {
        lock(&self.clipboard).clone()
    }

    /// Most recent clipboard contents
    pub fn clipboard(&self) -> Option<String> {
        lock(&self.clipboard).last().cloned()
    }

    pub fn pending_tasks(&self) -> usize {
        lock(&self.tasks).len()
    }

    /// Drive every spawned task to completion, including tasks spawned
    /// while running. Returns how many ran.
    pub async fn run_tasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let batch = std::mem::take(&mut *lock(&self.tasks));
            if batch.is_empty() {
                return ran;
            }
            for task in batch {
                task.await;
                ran += 1;
            }
        }
    }
}

impl App for MockApp {
    fn notice(&self, message: &str) {
        lock(&self.notices).push(message.to_string());
    }

    fn write_clipboard(&self, text: &str) -> Result<(), PluginError> {
        lock(&self.clipboard).push(text.to_string());
        Ok(())
    }

    fn spawn(&self, task: BackgroundTask) {
        lock(&self.tasks).push(task);
    }

    fn active_file(&self) -> Option<NoteFile> {
        lock(&self.active_file).clone()
    }

    fn editor(&self) -> Option<Arc<dyn Editor>> {
        self.editor.clone().map(|editor| editor as Arc<dyn Editor>)
    }

    fn vault(&self) -> Option<Arc<dyn Vault>> {
        self.vault.clone().map(|vault| vault as Arc<dyn Vault>)
    }

    fn http(&self) -> Option<Arc<dyn HttpClient>> {
        self.http.clone().map(|http| http as Arc<dyn HttpClient>)
    }

    fn pick_files(&self) -> Vec<ImportedFile> {
        std::mem::take(&mut *lock(&self.picked_files))
    }

    fn prompt(&self, _title: &str) -> Option<String> {
        lock(&self.prompt_answer).clone()
    }
}

/// Editor holding a single selection
#[derive(Default)]
pub struct MockEditor {
    selection: Mutex<String>,
    replacements: Mutex<Vec<String>>,
}

impl MockEditor {
    pub fn new(selection: impl Into<String>) -> Self {
        Self {
            selection: Mutex::new(selection.into()),
            replacements: Mutex::new(Vec::new()),
        }
    }

    pub fn set_selection(&self, selection: impl Into<String>) {
        *lock(&self.selection) = selection.into();
    }

    /// Text passed to every `replace_selection` call
    pub fn replacements(&self) -> Vec<String> {
        lock(&self.replacements).clone()
    }
}

impl Editor for MockEditor {
    fn selection(&self) -> String {
        lock(&self.selection).clone()
    }

    fn replace_selection(&self, text: &str) {
        lock(&self.replacements).push(text.to_string());
        *lock(&self.selection) = String::new();
    }
}

/// Vault backed by a map of path to contents
#[derive(Default)]
pub struct MemoryVault {
    files: Mutex<BTreeMap<String, String>>,
    new_file_folder: Option<String>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: seed a file
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        lock(&self.files).insert(path.into(), content.into());
        self
    }

    /// Builder: the host's default folder for new notes
    pub fn with_new_file_folder(mut self, folder: impl Into<String>) -> Self {
        self.new_file_folder = Some(folder.into());
        self
    }

    pub fn contents(&self, path: &str) -> Option<String> {
        lock(&self.files).get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        lock(&self.files).keys().cloned().collect()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn read(&self, path: &str) -> Result<String, PluginError> {
        self.contents(path).ok_or_else(|| {
            PluginError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such note: {}", path),
            ))
        })
    }

    async fn create(&self, path: &str, content: &str) -> Result<NoteFile, PluginError> {
        let mut files = lock(&self.files);
        if files.contains_key(path) {
            return Err(PluginError::Io(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("note already exists: {}", path),
            )));
        }
        files.insert(path.to_string(), content.to_string());
        Ok(NoteFile::new(path))
    }

    fn file_exists(&self, path: &str) -> bool {
        lock(&self.files).contains_key(path)
    }

    fn new_file_folder(&self) -> Option<String> {
        self.new_file_folder.clone()
    }
}

/// Transport that replays queued replies and records requests
#[derive(Default)]
pub struct MockHttpClient {
    replies: Mutex<VecDeque<Result<HttpReply, String>>>,
    requests: Mutex<Vec<(String, Vec<FormField>)>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next request
    pub fn queue_reply(&self, status: u16, body: serde_json::Value) {
        lock(&self.replies).push_back(Ok(HttpReply { status, body }));
    }

    /// Queue a transport failure for the next request
    pub fn queue_failure(&self, message: impl Into<String>) {
        lock(&self.replies).push_back(Err(message.into()));
    }

    /// Every request sent so far as (url, fields)
    pub fn requests(&self) -> Vec<(String, Vec<FormField>)> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_form(&self, url: &str, fields: Vec<FormField>) -> Result<HttpReply, PluginError> {
        lock(&self.requests).push((url.to_string(), fields));
        match lock(&self.replies).pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(PluginError::Upload(message)),
            None => Err(PluginError::Upload("no reply queued".to_string())),
        }
    }
}
