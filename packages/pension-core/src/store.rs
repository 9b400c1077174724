//! Persistence of the last uploaded source document.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Key-value store holding a single raw document.
pub trait Store {
    /// Prepare the backing storage. Safe to call more than once.
    fn init(&mut self) -> Result<()>;

    /// Replace the stored document.
    fn save(&mut self, document: &Value) -> Result<()>;

    /// The stored document, if any.
    fn get(&self) -> Result<Option<Value>>;

    /// Drop the stored document.
    fn clear(&mut self) -> Result<()>;
}

/// On-disk envelope around the stored document.
#[derive(Debug, Serialize, Deserialize)]
struct StoredDocument {
    saved_at: DateTime<Utc>,
    data: Value,
}

/// JSON file store.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at the default path.
    ///
    /// Default path: `~/.pension/pension_data.json`
    /// Can be overridden with `PENSION_STORE_FILE` environment variable.
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("PENSION_STORE_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".pension/pension_data.json"))
            .unwrap_or_else(|| PathBuf::from("pension_data.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, action: &str, err: impl std::fmt::Display) -> Error {
        Error::Persistence(format!("{action} {}: {err}", self.path.display()))
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for FileStore {
    fn init(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| self.persistence_error("cannot create directory for", e))?;
            }
        }
        Ok(())
    }

    fn save(&mut self, document: &Value) -> Result<()> {
        self.init()?;
        let stored = StoredDocument {
            saved_at: Utc::now(),
            data: document.clone(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.path, content).map_err(|e| self.persistence_error("cannot write", e))
    }

    fn get(&self) -> Result<Option<Value>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content =
            fs::read_to_string(&self.path).map_err(|e| self.persistence_error("cannot read", e))?;
        let data: Value = serde_json::from_str(&content)
            .map_err(|e| self.persistence_error("corrupt store file", e))?;

        // Files written by hand hold the bare document
        match serde_json::from_value::<StoredDocument>(data.clone()) {
            Ok(stored) => Ok(Some(stored.data)),
            Err(_) => Ok(Some(data)),
        }
    }

    fn clear(&mut self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).map_err(|e| self.persistence_error("cannot remove", e))?;
        }
        Ok(())
    }
}

/// In-memory store (no persistence).
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Option<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    fn save(&mut self, document: &Value) -> Result<()> {
        self.document = Some(document.clone());
        Ok(())
    }

    fn get(&self) -> Result<Option<Value>> {
        Ok(self.document.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.document = None;
        Ok(())
    }
}
