//! A directory on disk as the note vault

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use toolbox_plugin_api::{NoteFile, PluginError, Vault};

pub struct FsVault {
    root: PathBuf,
    new_file_folder: Option<String>,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            new_file_folder: None,
        }
    }

    pub fn with_new_file_folder(mut self, folder: Option<String>) -> Self {
        self.new_file_folder = folder;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Vault paths are relative to the root; a leading '/' is ignored
    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn read(&self, path: &str) -> Result<String, PluginError> {
        Ok(tokio::fs::read_to_string(self.resolve(path)).await?)
    }

    async fn create(&self, path: &str, content: &str) -> Result<NoteFile, PluginError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => PluginError::Io(std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    format!("note already exists: {path}"),
                )),
                _ => PluginError::Io(e),
            })?;
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(path = %target.display(), "Note created");
        Ok(NoteFile::new(path.trim_start_matches('/')))
    }

    fn file_exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }

    fn new_file_folder(&self) -> Option<String> {
        self.new_file_folder.clone()
    }
}
