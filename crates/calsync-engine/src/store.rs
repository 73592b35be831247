//! Key-value stores backing the sync ledger.
//!
//! The ledger only needs string keys and string values, so any persistent
//! map will do. Two stores are provided:
//!
//! - [`MemoryStore`] keeps entries in process memory (tests, previews).
//! - [`JsonFileStore`] keeps entries in one JSON object on disk. The file is
//!   created on first write and replaced atomically on every write; other
//!   processes' entries are merged in rather than overwritten.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Lists every key.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// In-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.lock().keys().cloned().collect())
    }
}

/// Key-value store persisted as a single JSON object.
///
/// Every operation reloads the file first, and a write merges its key into
/// what is on disk at that moment. Entries written by another process are
/// therefore kept. Two processes writing within the same reload-and-rename
/// interval can still lose one update: the file is not locked.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Opens the store at `path`, loading existing entries.
    ///
    /// A missing file is an empty store; a file that is not a JSON object of
    /// strings is an error.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let entries = load(&path)?;

        debug!(path = %path.display(), entries = entries.len(), "Opened ledger file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Locks the entries and replaces them with the current file content.
    fn reload(&self) -> StoreResult<MutexGuard<'_, BTreeMap<String, String>>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        *entries = load(&self.path)?;
        Ok(entries)
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn load(path: &Path) -> StoreResult<BTreeMap<String, String>> {
    match fs::read_to_string(path) {
        Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| StoreError::corrupt(path, e.to_string())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.reload()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.reload()?;
        if entries.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }

        // Memory only changes once the file has been replaced.
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.save(&next)?;
        *entries = next;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.reload()?.keys().cloned().collect())
    }
}
