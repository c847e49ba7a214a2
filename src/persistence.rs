//! Key/value persistence for dashboard state
//!
//! State is a flat map of string keys to string values, the same shape a
//! browser keeps in local storage. Every write goes straight to disk so a
//! restart always sees the last mutation.

use crate::error::{ChargeDeckError, Result};
use crate::logging::get_logger;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Synchronous string key/value store
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, persisting immediately
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value, persisting immediately; absent keys are not an error
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently stored
    fn keys(&self) -> Vec<String>;
}

/// In-memory store, used by tests and when no state file is wanted
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

/// Store backed by a JSON object on disk
pub struct FileStore {
    file_path: PathBuf,
    entries: BTreeMap<String, String>,
    logger: crate::logging::StructuredLogger,
}

impl FileStore {
    /// Create a store for `file_path` without touching the disk
    pub fn new<P: AsRef<Path>>(file_path: P) -> Self {
        Self {
            file_path: file_path.as_ref().to_path_buf(),
            entries: BTreeMap::new(),
            logger: get_logger("persistence"),
        }
    }

    /// Create a store and load whatever is on disk
    pub fn open<P: AsRef<Path>>(file_path: P) -> Result<Self> {
        let mut store = Self::new(file_path);
        store.load()?;
        Ok(store)
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Load state from disk
    ///
    /// A missing file leaves the store empty. A file that is not a JSON object
    /// of strings is discarded with a warning and the store starts empty.
    pub fn load(&mut self) -> Result<()> {
        if !self.file_path.exists() {
            self.logger
                .info("No persistent state file found, using defaults");
            return Ok(());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        match serde_json::from_str::<BTreeMap<String, String>>(&contents) {
            Ok(entries) => {
                self.entries = entries;
                self.logger.info(&format!(
                    "Loaded {} persisted keys from {}",
                    self.entries.len(),
                    self.file_path.display()
                ));
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "Discarding unreadable state file {}: {}",
                    self.file_path.display(),
                    e
                ));
                self.entries.clear();
            }
        }

        Ok(())
    }

    /// Save state to disk via a sibling temp file renamed into place
    pub fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.entries)?;
        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let mut tmp = self.file_path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        std::fs::write(&tmp, contents)
            .map_err(|e| ChargeDeckError::storage(format!("write {}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.file_path).map_err(|e| {
            ChargeDeckError::storage(format!("replace {}: {}", self.file_path.display(), e))
        })?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_get_remove() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").is_none());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.remove("a").unwrap();
        store.remove("a").unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let mut store = FileStore::new(&path);
        store.set("k", "v").unwrap();
        assert!(path.exists());
    }
}
