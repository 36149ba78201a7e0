//! Persistent key-value storage for session and cart state.
//!
//! Components never touch a storage medium directly; they go through a
//! [`KeyValueStore`] handed to them at construction, so tests can swap in a
//! [`MemoryStore`] or a store that fails on demand.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Bearer credential string.
    pub const CREDENTIAL: &str = "fastbite_token";

    /// Serialized user profile.
    pub const PROFILE: &str = "fastbite_user";

    /// Serialized cart line sequence.
    pub const CART: &str = "fastbite_cart";
}

/// Errors raised by a storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium could not be read or written.
    #[error("storage unavailable for key '{key}': {source}")]
    Unavailable {
        /// Key being accessed.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// A value could not be serialized for storage.
    #[error("could not encode value for key '{key}': {source}")]
    Encode {
        /// Key being written.
        key: String,
        /// Underlying serialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// Another holder of the store panicked mid-write.
    #[error("storage lock poisoned")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        Self::Poisoned
    }
}

/// Abstraction over a string key-value medium.
///
/// Implementations must make each `set` visible in full or not at all.
pub trait KeyValueStore: Send + Sync {
    /// Read a value. Missing keys yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// =============================================================================
// MemoryStore
// =============================================================================

/// Process-local store. State is lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock()?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock()?.remove(key);
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Directory-backed store with one file per key.
///
/// Writes land in a sibling temp file that is then renamed over the target,
/// so readers see either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Unavailable {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the store.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed identifiers; anything outside [A-Za-z0-9_-] is
        // replaced so a key can never escape the directory.
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{file}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Unavailable {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        fs::write(&staging, value)
            .and_then(|()| fs::rename(&staging, &target))
            .map_err(|source| StorageError::Unavailable {
                key: key.to_owned(),
                source,
            })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Unavailable {
                key: key.to_owned(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fastbite-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_store_remove_missing_is_ok() {
        assert!(MemoryStore::new().remove("missing").is_ok());
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = temp_dir();
        FileStore::open(&dir).unwrap().set(keys::CART, "[1]").unwrap();

        let reopened = FileStore::open(&dir).unwrap();
        assert_eq!(reopened.get(keys::CART).unwrap().as_deref(), Some("[1]"));

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_overwrite_and_remove() {
        let dir = temp_dir();
        let store = FileStore::open(&dir).unwrap();
        store.set(keys::PROFILE, "a").unwrap();
        store.set(keys::PROFILE, "b").unwrap();
        assert_eq!(store.get(keys::PROFILE).unwrap().as_deref(), Some("b"));

        store.remove(keys::PROFILE).unwrap();
        store.remove(keys::PROFILE).unwrap();
        assert_eq!(store.get(keys::PROFILE).unwrap(), None);

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_sanitizes_keys() {
        let store = FileStore::open(temp_dir()).unwrap();
        let path = store.path_for("../escape");
        assert_eq!(path.parent(), Some(store.dir()));
        fs::remove_dir_all(store.dir()).unwrap();
    }
}
