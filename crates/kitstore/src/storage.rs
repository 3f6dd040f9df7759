//! Key-value storage for small persisted values such as the cart.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use eyre::Result;

/// String key-value store, similar to a browser's local storage.
pub trait KeyValueStorage: Send {
    /// Returns the value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<String>>;
    /// Stores `value` under `key`, replacing any existing value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removes the value stored under `key`, if any.
    fn remove(&mut self, key: &str) -> Result<()>;
    /// Moves an unreadable value out of the way so that it is not overwritten.
    fn backup(&mut self, key: &str);
}

/// Storage that keeps one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}
impl FileStorage {
    /// Constructs storage rooted at `dir`. The directory is created on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
    /// Constructs storage in the user's data directory.
    pub fn user() -> Result<Self> {
        Ok(Self::new(kitpaths::storage_dir()?))
    }

    /// Returns the directory containing the storage files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        kitpaths::storage_file_in(&self.dir, key)
    }
}
impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }
    fn remove(&mut self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
    fn backup(&mut self, key: &str) {
        kitpaths::move_to_backup_file(&self.path(key));
    }
}

/// Storage that lives only as long as the value itself.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
    backups: Vec<(String, String)>,
}
impl MemoryStorage {
    /// Constructs empty storage.
    pub fn new() -> Self {
        Self::default()
    }
    /// Returns values that were moved aside by [`KeyValueStorage::backup()`].
    pub fn backups(&self) -> &[(String, String)] {
        &self.backups
    }
}
impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
    fn backup(&mut self, key: &str) {
        if let Some(value) = self.entries.remove(key) {
            self.backups.push((key.to_owned(), value));
        }
    }
}
