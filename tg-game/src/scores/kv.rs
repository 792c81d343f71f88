//! Key-value persistence backends

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tg_common::config::write_atomic;

/// Persistence failures (never fatal to the game)
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backing storage could not be read
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Backing storage rejected a write
    #[error("Storage write failed: {0}")]
    WriteFailed(String),

    /// Stored value could not be decoded
    #[error("Corrupt value for {key}: {message}")]
    Corrupt { key: String, message: String },
}

/// String key-value storage
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Session-only storage; everything is lost on exit
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    values: HashMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// All keys in one JSON object on disk
///
/// Every `set` rewrites the whole file atomically. A missing file reads as
/// empty storage.
#[derive(Debug, Clone)]
pub struct FileKv {
    path: PathBuf,
}

impl FileKv {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })
    }
}

impl KeyValueStore for FileKv {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = match self.read_all() {
            Ok(values) => values,
            Err(StoreError::Corrupt { message, .. }) => {
                tracing::warn!(path = %self.path.display(), error = %message, "Replacing corrupt score file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        values.insert(key.to_string(), value.to_string());

        let content = serde_json::to_vec_pretty(&values)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        write_atomic(&self.path, &content).map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}
