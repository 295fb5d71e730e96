//! Key-value storage backing persisted records.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("valid key pattern"));

const RECORD_EXTENSION: &str = "json";

/// Errors raised by a [`KeyValueStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key contains characters outside `[A-Za-z0-9_]` or is empty.
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    /// Filesystem access failed.
    #[error("storage I/O failed for {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The store refused the write.
    #[error("storage is read-only")]
    ReadOnly,
}

/// Minimal string key-value store.
pub trait KeyValueStore {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Delete `key`; deleting a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if KEY_PATTERN.is_match(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

/// Store keeping one `<key>.json` file per key under a root directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Keys currently present, sorted.
    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable storage entry: {err}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if KEY_PATTERN.is_match(stem) {
                    keys.push(stem.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.{RECORD_EXTENSION}")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root).map_err(|source| StorageError::Io {
            path: self.root.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(key, path = %path.display(), bytes = value.len(), "Stored record");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// In-process store, used for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with [`StorageError::ReadOnly`].
    pub fn set_read_only(&self, read_only: bool) {
        *self.read_only.lock() = read_only;
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if *self.read_only.lock() {
            Err(StorageError::ReadOnly)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.check_writable()?;
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        self.check_writable()?;
        self.values.lock().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_round_trip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path().join("storage"));

        assert_eq!(store.get("travelRoute")?, None);
        assert!(store.keys()?.is_empty());

        store.set("travelRoute", "{\"route\":[]}")?;
        store.set("lastSearch", "{}")?;
        assert_eq!(store.get("travelRoute")?.as_deref(), Some("{\"route\":[]}"));
        assert_eq!(store.keys()?, vec!["lastSearch", "travelRoute"]);

        store.remove("travelRoute")?;
        store.remove("travelRoute")?;
        assert_eq!(store.get("travelRoute")?, None);
        Ok(())
    }

    #[test]
    fn keys_ignore_foreign_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = FileStore::new(dir.path());
        store.set("lastSearch", "{}")?;
        fs::write(dir.path().join("notes.txt"), "x")?;
        fs::write(dir.path().join("bad key.json"), "x")?;
        fs::create_dir_all(dir.path().join("nested.json"))?;
        assert_eq!(store.keys()?, vec!["lastSearch"]);
        Ok(())
    }

    #[test]
    fn rejects_path_like_keys() {
        let store = MemoryStore::new();
        for key in ["", "../escape", "a/b", "1abc", "with space"] {
            assert!(matches!(
                store.set(key, "x"),
                Err(StorageError::InvalidKey(_))
            ));
        }
        let files = FileStore::new("/nonexistent");
        assert!(matches!(
            files.get("../etc/passwd"),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn memory_store_can_refuse_writes() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set("lastSearch", "{}")?;
        store.set_read_only(true);
        assert!(matches!(
            store.set("lastSearch", "[]"),
            Err(StorageError::ReadOnly)
        ));
        assert!(matches!(
            store.remove("lastSearch"),
            Err(StorageError::ReadOnly)
        ));
        assert_eq!(store.get("lastSearch")?.as_deref(), Some("{}"));
        Ok(())
    }
}
