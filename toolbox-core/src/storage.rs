//! Settings persistence
//!
//! The lifecycle manager reads and writes the whole settings document
//! through [`SettingsStorage`]; the host decides where it lives.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::error::StorageError;

/// Load and save the persisted settings document
#[async_trait]
pub trait SettingsStorage: Send + Sync {
    /// The persisted document, or `None` when nothing has been saved yet
    async fn load(&self) -> Result<Option<Value>, StorageError>;

    /// Replace the persisted document
    async fn save(&self, document: &Value) -> Result<(), StorageError>;
}

/// Pretty-printed JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `$XDG_CONFIG_HOME/toolbox/data.json`
    pub fn at_default_location() -> Self {
        Self::new(toolbox_paths::settings_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStorage for JsonFileStorage {
    async fn load(&self) -> Result<Option<Value>, StorageError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "No settings file yet");
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).await?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let document = serde_json::from_str(&content).map_err(|source| StorageError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(document))
    }

    async fn save(&self, document: &Value) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(document).map_err(StorageError::Serialize)?;
        fs::write(&self.path, content).await?;
        tracing::debug!(path = %self.path.display(), "Saved settings");
        Ok(())
    }
}

/// In-memory storage that records every save, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStorage {
    document: Mutex<Option<Value>>,
    saves: Mutex<Vec<Value>>,
    loads: AtomicUsize,
    fail: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage that already holds `document`
    pub fn with_document(document: Value) -> Self {
        let storage = Self::default();
        *storage.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document);
        storage
    }

    /// The currently persisted document
    pub fn document(&self) -> Option<Value> {
        self.document
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every document passed to `save`, in order
    pub fn saves(&self) -> Vec<Value> {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Make subsequent loads and saves fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("memory storage set to fail".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStorage for MemoryStorage {
    async fn load(&self) -> Result<Option<Value>, StorageError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.document())
    }

    async fn save(&self, document: &Value) -> Result<(), StorageError> {
        self.check()?;
        *self.document.lock().unwrap_or_else(PoisonError::into_inner) = Some(document.clone());
        self.saves
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document.clone());
        Ok(())
    }
}
