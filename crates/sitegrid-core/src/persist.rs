// ── Durable key/value backends ──
//
// The cache and the highlight set each own one string entry. Backends
// only move strings; encoding lives with the owner of the key.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use tracing::trace;

use crate::error::PersistenceError;

/// A durable map of string keys to string values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

fn check_key(key: &str) -> Result<(), PersistenceError> {
    let ok = !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_owned()))
    }
}

// ── FileStore ──────────────────────────────────────────────────────

/// One JSON file per key inside a directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so
/// a reader never sees a half-written entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PersistenceError + '_ {
        move |source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        check_key(key)?;
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_err(&path)(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        check_key(key)?;
        std::fs::create_dir_all(&self.dir).map_err(Self::io_err(&self.dir))?;

        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(Self::io_err(&tmp))?;
        std::fs::rename(&tmp, &path).map_err(Self::io_err(&path))?;
        trace!(key, bytes = value.len(), "persisted entry");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        check_key(key)?;
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_err(&path)(e)),
        }
    }
}

// ── MemoryStore ────────────────────────────────────────────────────

/// In-process store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.entries.remove(key);
        Ok(())
    }
}
