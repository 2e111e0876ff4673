//! Persistent local key/value storage.
//!
//! A single JSON object on disk holding the values the client must remember
//! between runs (the bearer token and the signed-in user). Every write
//! rewrites the whole file through a temporary sibling and a rename.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Storage keys for session data.
pub mod keys {
    /// Key for the bearer token.
    pub const TOKEN: &str = "token";

    /// Key for the signed-in user object.
    pub const USER: &str = "user";
}

/// Errors that can occur when reading or writing local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File or value is not valid JSON of the expected shape.
    #[error("Storage data is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// File-backed key/value store.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Open storage at `path`. The file is created lazily on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode a value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be read or the stored value
    /// does not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let mut entries = self.read_all()?;
        entries
            .remove(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    /// Store a value under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be read or written.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), serde_json::to_value(value)?);
        self.write_all(&entries)
    }

    /// Remove the given keys. Missing keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the file cannot be read or written.
    pub fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let (mut entries, mut changed) = match self.read_all() {
            Ok(entries) => (entries, false),
            // A corrupt file is discarded rather than blocking a logout
            Err(StorageError::Malformed(_)) => (BTreeMap::new(), true),
            Err(e) => return Err(e),
        };
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if !changed {
            return Ok(());
        }
        self.write_all(&entries)
    }

    fn read_all(&self) -> Result<BTreeMap<String, Value>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(|e| self.io_error(e))?;
        restrict_permissions(&tmp).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// The file holds a bearer token; keep it private to the owner.
#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_storage(name: &str) -> LocalStorage {
        let dir = std::env::temp_dir().join(format!(
            "scuffmart-storage-{name}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        LocalStorage::new(dir.join("nested").join("storage.json"))
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let storage = temp_storage("missing");
        assert_eq!(storage.get::<String>(keys::TOKEN).unwrap(), None);
    }

    #[test]
    fn test_set_get_remove() {
        let storage = temp_storage("roundtrip");
        storage.set(keys::TOKEN, &"abc").unwrap();
        storage.set(keys::USER, &serde_json::json!({"id": 1})).unwrap();
        assert_eq!(
            storage.get::<String>(keys::TOKEN).unwrap().as_deref(),
            Some("abc")
        );

        storage.remove(&[keys::TOKEN]).unwrap();
        assert_eq!(storage.get::<String>(keys::TOKEN).unwrap(), None);
        assert!(storage.get::<Value>(keys::USER).unwrap().is_some());
    }

    #[test]
    fn test_malformed_file_is_reported_and_cleared_on_remove() {
        let storage = temp_storage("malformed");
        fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        fs::write(storage.path(), "{not json").unwrap();

        assert!(matches!(
            storage.get::<String>(keys::TOKEN),
            Err(StorageError::Malformed(_))
        ));
        storage.remove(&[keys::TOKEN, keys::USER]).unwrap();
        assert_eq!(storage.get::<String>(keys::TOKEN).unwrap(), None);
    }
}
