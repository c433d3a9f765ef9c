//! Key/value storage backends

use dashmap::DashMap;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

/// Local storage errors
#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    /// Filesystem failure
    #[error("storage I/O failed for {key}: {source}")]
    Io {
        /// Storage key
        key: String,
        /// Cause
        #[source]
        source: io::Error,
    },

    /// Value could not be encoded
    #[error("failed to encode {key}: {source}")]
    Encode {
        /// Storage key
        key: String,
        /// Cause
        #[source]
        source: serde_json::Error,
    },
}

impl LocalStoreError {
    fn io(key: &str, source: io::Error) -> Self {
        Self::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// String key/value store, synchronous and last-write-wins
pub trait LocalStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Backend failures other than a missing key.
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;

    /// Write a value, replacing any previous one
    ///
    /// # Errors
    /// Backend failures.
    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;

    /// Delete a value; missing keys are fine
    ///
    /// # Errors
    /// Backend failures.
    fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key under a directory.
///
/// Writes go to a temporary file in the same directory that is then
/// renamed over the target, so readers see the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Store rooted at `root`, created if missing
    ///
    /// # Errors
    /// When the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, LocalStoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| LocalStoreError::io(&root.display().to_string(), e))?;
        Ok(Self { root })
    }

    /// Root directory
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing `key`
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name(key))
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocalStoreError::io(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError> {
        let mut file = tempfile::NamedTempFile::new_in(&self.root).map_err(|e| LocalStoreError::io(key, e))?;
        file.write_all(value.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| LocalStoreError::io(key, e))?;
        file.persist(self.path_for(key))
            .map_err(|e| LocalStoreError::io(key, e.error))?;
        tracing::trace!(key, bytes = value.len(), "stored");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LocalStoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LocalStoreError::io(key, e)),
        }
    }
}

/// Escape a key into a portable file name
fn file_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.') {
            name.push(char::from(byte));
        } else {
            let _ = write!(name, "%{byte:02X}");
        }
    }
    name.push_str(".json");
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_escaped() {
        assert_eq!(file_name("theme"), "theme.json");
        assert_eq!(file_name("task-activity:t1"), "task-activity%3At1.json");
        assert_eq!(file_name("../etc"), "..%2Fetc.json");
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_replaces_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("nested")).unwrap();

        store.set("task-activity:t1", "[]").unwrap();
        store.set("task-activity:t1", r#"[{"text":"hi","ts":1}]"#).unwrap();

        assert_eq!(
            store.get("task-activity:t1").unwrap().as_deref(),
            Some(r#"[{"text":"hi","ts":1}]"#)
        );
        assert!(store.path_for("task-activity:t1").exists());
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.get("nothing").unwrap(), None);
        store.remove("nothing").unwrap();
    }
}
