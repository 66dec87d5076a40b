//! Client-side key/value storage
//!
//! A small JSON document kept in `.murp/local_storage.json`. It plays the role
//! browser local storage plays for a web client: user preferences that never
//! round-trip through the data store, plus caches for external lookups.
//! Every `set` writes the whole document back to disk.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Keys used across the crate
pub mod keys {
    pub const SHEETS_AUTO_BACKUP: &str = "google_sheets_auto_backup";
    pub const SHEETS_LAST_BACKUP: &str = "google_sheets_last_backup";
    pub const DOCS_CACHE: &str = "docs_cache";
    pub const DOCS_HISTORY: &str = "docs_history";
}

#[derive(Debug, Error)]
pub enum LocalStorageError {
    #[error("failed to write {path}: {message}")]
    Write { path: PathBuf, message: String },

    #[error("failed to encode value for key '{key}': {message}")]
    Encode { key: String, message: String },
}

#[derive(Debug)]
pub struct LocalStorage {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl LocalStorage {
    /// Load storage from disk. A missing or corrupt file yields empty storage.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Map<String, Value>>(&content) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "local storage is corrupt, starting empty");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        };

        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Read a typed value. Values that no longer decode as `T` are treated as absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), LocalStorageError> {
        let encoded = serde_json::to_value(value).map_err(|e| LocalStorageError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.entries.insert(key.to_string(), encoded);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), LocalStorageError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), LocalStorageError> {
        let content = serde_json::to_string_pretty(&self.entries).map_err(|e| {
            LocalStorageError::Encode {
                key: "*".to_string(),
                message: e.to_string(),
            }
        })?;
        fs::write(&self.path, content).map_err(|e| LocalStorageError::Write {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempdir().unwrap();
        let storage = LocalStorage::load(&tmp.path().join("nope.json"));
        assert!(!storage.contains("anything"));
    }

    #[test]
    fn test_set_persists_across_loads() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ls.json");

        let mut storage = LocalStorage::load(&path);
        storage.set(keys::SHEETS_AUTO_BACKUP, &true).unwrap();

        let reloaded = LocalStorage::load(&path);
        assert_eq!(reloaded.get::<bool>(keys::SHEETS_AUTO_BACKUP), Some(true));
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        fs::write(&path, "{not json").unwrap();

        let storage = LocalStorage::load(&path);
        assert_eq!(storage.get::<bool>(keys::SHEETS_AUTO_BACKUP), None);
    }

    #[test]
    fn test_remove_deletes_key() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        let mut storage = LocalStorage::load(&path);
        storage.set("a", &"value").unwrap();
        storage.remove("a").unwrap();

        assert!(!LocalStorage::load(&path).contains("a"));
    }

    #[test]
    fn test_wrong_type_reads_as_absent() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("ls.json");
        let mut storage = LocalStorage::load(&path);
        storage.set("flag", &"yes").unwrap();
        assert_eq!(storage.get::<bool>("flag"), None);
    }
}
