//! JSON-file [`KeyValueStorage`] so a CLI session survives between runs.
//!
//! The whole file is one JSON object of string values. Every call re-reads
//! the file; writes replace it in full. A missing or unreadable file behaves
//! as empty storage.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use milsabores::error::StorageError;
use milsabores::session::store::KeyValueStorage;

pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
            BTreeMap::new()
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>, key: &str) -> Result<(), StorageError> {
        let write_error = |reason: String| StorageError::Write { key: key.to_owned(), reason };
        if items.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(write_error(e.to_string())),
            };
        }
        let raw = serde_json::to_string_pretty(items).map_err(|e| StorageError::Serialize(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| write_error(e.to_string()))
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all();
        items.insert(key.to_owned(), value.to_owned());
        self.write_all(&items, key)
    }

    fn remove_item(&self, key: &str) {
        let mut items = self.read_all();
        if items.remove(key).is_none() {
            return;
        }
        if let Err(e) = self.write_all(&items, key) {
            tracing::warn!(error = %e, "failed to update session file");
        }
    }
}
