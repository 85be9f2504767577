//! Terminal host for the sub-plugins
//!
//! Notices go to stderr, the "clipboard" is stdout, and the selection or a
//! prompt answer is read from stdin when a command asks for it.

mod editor;
mod http;
mod vault;

pub use editor::StdinEditor;
pub use http::ReqwestClient;
pub use vault::FsVault;

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use toolbox_plugin_api::{
    App, BackgroundTask, Editor, HttpClient, ImportedFile, NoteFile, PluginError, Vault,
};

pub type SharedInput = Arc<Mutex<Box<dyn BufRead + Send>>>;
pub type SharedOutput = Arc<Mutex<Box<dyn Write + Send>>>;

pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct TerminalApp {
    input: SharedInput,
    stdout: SharedOutput,
    stderr: SharedOutput,
    editor: Arc<StdinEditor>,
    vault: Option<Arc<FsVault>>,
    http: Option<Arc<ReqwestClient>>,
    active_file: Option<NoteFile>,
    attachments: Vec<PathBuf>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl TerminalApp {
    /// App wired to the process's stdin, stdout and stderr
    pub fn new() -> Self {
        Self::with_io(
            Box::new(BufReader::new(std::io::stdin())),
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    pub fn with_io(
        input: Box<dyn BufRead + Send>,
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
    ) -> Self {
        let input: SharedInput = Arc::new(Mutex::new(input));
        let stdout: SharedOutput = Arc::new(Mutex::new(stdout));
        Self {
            editor: Arc::new(StdinEditor::new(Arc::clone(&input), Arc::clone(&stdout))),
            input,
            stdout,
            stderr: Arc::new(Mutex::new(stderr)),
            vault: None,
            http: None,
            active_file: None,
            attachments: Vec::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn with_vault(mut self, vault: FsVault) -> Self {
        self.vault = Some(Arc::new(vault));
        self
    }

    pub fn with_http(mut self, http: ReqwestClient) -> Self {
        self.http = Some(Arc::new(http));
        self
    }

    /// Note the commands treat as the one open in the editor
    pub fn with_active_file(mut self, path: impl Into<String>) -> Self {
        self.active_file = Some(NoteFile::new(path));
        self
    }

    /// Files offered when a command asks the user to pick some
    pub fn with_attachments(mut self, paths: Vec<PathBuf>) -> Self {
        self.attachments = paths;
        self
    }

    /// Wait for every spawned task, including tasks spawned by tasks
    pub async fn join_tasks(&self) -> usize {
        let mut joined = 0;
        loop {
            let batch: Vec<JoinHandle<()>> = std::mem::take(&mut *lock(&self.tasks));
            if batch.is_empty() {
                return joined;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "Background task did not finish");
                }
                joined += 1;
            }
        }
    }

    fn write_line(output: &SharedOutput, text: &str) -> std::io::Result<()> {
        let mut output = lock(output);
        writeln!(output, "{text}")?;
        output.flush()
    }
}

impl Default for TerminalApp {
    fn default() -> Self {
        Self::new()
    }
}

impl App for TerminalApp {
    fn notice(&self, message: &str) {
        if let Err(e) = Self::write_line(&self.stderr, message) {
            tracing::warn!(error = %e, notice = %message, "Failed to print notice");
        }
    }

    fn write_clipboard(&self, text: &str) -> Result<(), PluginError> {
        Self::write_line(&self.stdout, text)?;
        Ok(())
    }

    fn spawn(&self, task: BackgroundTask) {
        let handle = tokio::spawn(task);
        lock(&self.tasks).push(handle);
    }

    fn active_file(&self) -> Option<NoteFile> {
        self.active_file.clone()
    }

    fn editor(&self) -> Option<Arc<dyn Editor>> {
        Some(Arc::clone(&self.editor) as Arc<dyn Editor>)
    }

    fn vault(&self) -> Option<Arc<dyn Vault>> {
        self.vault.clone().map(|vault| vault as Arc<dyn Vault>)
    }

    fn http(&self) -> Option<Arc<dyn HttpClient>> {
        self.http.clone().map(|http| http as Arc<dyn HttpClient>)
    }

    fn pick_files(&self) -> Vec<ImportedFile> {
        let mut files = Vec::new();
        for path in &self.attachments {
            match read_attachment(path) {
                Ok(file) => files.push(file),
                Err(e) => self.notice(&format!("Skipping {}: {e}", path.display())),
            }
        }
        files
    }

    fn prompt(&self, title: &str) -> Option<String> {
        if let Err(e) = Self::write_line(&self.stderr, &format!("{title}:")) {
            tracing::debug!(error = %e, "Failed to print prompt");
        }
        let mut line = String::new();
        match lock(&self.input).read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read prompt answer");
                None
            }
        }
    }
}

fn read_attachment(path: &Path) -> std::io::Result<ImportedFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(ImportedFile::new(name, mime_type(path), bytes))
}

/// MIME type guessed from the file extension
pub fn mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
