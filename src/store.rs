//! Durable string key-value store.
//!
//! The wizard keeps session flags and the listing draft under fixed keys, the
//! way a browser profile keeps them in local storage. [`FileStore`] backs the
//! binary with a single JSON object file; [`MemoryStore`] backs tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Errors raised by a key-value store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access store file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A process-wide string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Key-value store persisted as one pretty-printed JSON object.
///
/// The file is the only copy of the data: every operation re-reads it, and
/// mutations write the whole object back. Several handles (or processes)
/// on the same path therefore see each other's changes instead of
/// overwriting them with a stale snapshot.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// An unreadable or corrupt file is logged and treated as empty; the next
    /// write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let store = Self {
            path,
            write_lock: Mutex::new(()),
        };
        // Surface a corrupt file once at startup
        store.load();
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current on-disk contents; missing or corrupt files read as empty
    fn load(&self) -> BTreeMap<String, String> {
        if !self.path.exists() {
            return BTreeMap::new();
        }
        match self.read_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable store file"
                );
                BTreeMap::new()
            }
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, contents).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load().remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut entries = self.load();
        if entries.remove(key).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set("authToken", "local-abc").unwrap();
        store.set("userRole", "admin").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").unwrap().as_deref(), Some("local-abc"));
        assert_eq!(reopened.get("userRole").unwrap().as_deref(), Some("admin"));
        assert_eq!(reopened.get("missing").unwrap(), None);
    }

    #[test]
    fn test_file_store_remove_rewrites_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set("propertyDraft", "{}").unwrap();
        store.remove("propertyDraft").unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("propertyDraft"));
    }

    #[test]
    fn test_file_store_remove_missing_key_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("store.json")).unwrap();
        assert!(store.remove("nothing").is_ok());
        // Nothing was ever written
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("authToken").unwrap(), None);

        store.set("authToken", "t").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").unwrap().as_deref(), Some("t"));
    }

    #[test]
    fn test_handles_on_one_path_see_each_other() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let wizard = FileStore::open(&path).unwrap();
        wizard.set("authToken", "tok").unwrap();

        // Another process signs out while the wizard is open
        let cli = FileStore::open(&path).unwrap();
        cli.remove("authToken").unwrap();
        assert_eq!(wizard.get("authToken").unwrap(), None);

        // The wizard's next autosave must not resurrect the token
        wizard.set("propertyDraft", r#"{"title":"A"}"#).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("authToken").unwrap(), None);
        assert_eq!(
            reopened.get("propertyDraft").unwrap().as_deref(),
            Some(r#"{"title":"A"}"#)
        );
    }

    #[test]
    fn test_memory_store_with_entries() {
        let store = MemoryStore::with_entries([("a", "1")]);
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}
