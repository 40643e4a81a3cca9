//! Session storage adapters
//!
//! `FileSessionStorage` keeps a flat JSON object in `storage.json` inside the
//! data directory, the terminal counterpart of a browser's local storage.
//! `MemorySessionStorage` is the ephemeral variant used by tests.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::domain::result::{Error, Result};
use crate::ports::SessionStorage;

const STORAGE_FILE: &str = "storage.json";
const LOCK_FILE: &str = "storage.lock";

/// File-backed key-value storage
///
/// Every operation takes an exclusive lock on `storage.lock` so concurrent
/// `rb` processes don't interleave read-modify-write cycles. Writes go to a
/// temp file that is renamed over `storage.json`.
#[derive(Debug)]
pub struct FileSessionStorage {
    dir: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn lock(&self) -> Result<File> {
        std::fs::create_dir_all(&self.dir)?;
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(LOCK_FILE))?;
        lock.lock_exclusive()
            .map_err(|e| Error::storage(format!("Failed to lock session storage: {}", e)))?;
        Ok(lock)
    }

    /// Read all entries; a missing or unreadable file counts as empty
    fn read_entries(&self) -> BTreeMap<String, String> {
        std::fs::read_to_string(self.path())
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(serde_json::to_string_pretty(entries)?.as_bytes())?;
        tmp.flush()?;
        tmp.persist(self.path())
            .map_err(|e| Error::storage(format!("Failed to write session storage: {}", e)))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> Result<()> {
        let lock = self.lock()?;
        let mut entries = self.read_entries();
        let changed = f(&mut entries);
        let result = if changed {
            self.write_entries(&entries)
        } else {
            Ok(())
        };
        let _ = lock.unlock();
        result
    }
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let lock = self.lock()?;
        let value = self.read_entries().remove(key);
        let _ = lock.unlock();
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.modify(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.modify(|entries| entries.remove(key).is_some())
    }
}

/// In-memory key-value storage
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}
