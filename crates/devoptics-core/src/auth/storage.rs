//! Key/value persistence backends for the credential store.
//!
//! Values are plain strings, the way a browser's local storage holds them.
//! Writes take a batch of entries so related keys land together or not at all.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

/// Storage file name inside the storage directory
const STORAGE_FILE: &str = "storage.json";

/// Durable string key/value storage.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write every entry, or none of them if the write fails.
    fn set(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Remove the given keys. Missing keys are ignored.
    fn remove(&self, keys: &[&str]) -> Result<()>;
}

/// Storage backed by a single JSON document on disk.
///
/// Every write replaces the whole document through a temporary file and a
/// rename, so readers see either the old document or the new one.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STORAGE_FILE)
    }

    fn read_raw(&self) -> Result<Option<String>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .context("Failed to read storage file")
    }

    fn parse(contents: &str) -> Result<BTreeMap<String, String>> {
        serde_json::from_str(contents).context("Failed to parse storage file")
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match self.read_raw()? {
            Some(contents) => Self::parse(&contents),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Read the document for modification. A document that does not parse is
    /// discarded and the flag reports that it must be rewritten; IO errors
    /// are returned so unrelated keys are never lost.
    fn read_for_update(&self) -> Result<(BTreeMap<String, String>, bool)> {
        let Some(contents) = self.read_raw()? else {
            return Ok((BTreeMap::new(), false));
        };
        match Self::parse(&contents) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(error = %e, path = ?self.path(), "Discarding unreadable storage file");
                Ok((BTreeMap::new(), true))
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;
        let contents = serde_json::to_string_pretty(entries)?;
        let tmp = self.dir.join(format!("{}.tmp", STORAGE_FILE));
        fs::write(&tmp, contents).context("Failed to write storage file")?;
        fs::rename(&tmp, self.path()).context("Failed to replace storage file")?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
        let (mut all, _) = self.read_for_update()?;
        for (key, value) in entries {
            all.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&all)?;
        debug!(keys = entries.len(), "Storage entries written");
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        if !self.path().exists() {
            return Ok(());
        }
        let (mut all, mut dirty) = self.read_for_update()?;
        for key in keys {
            dirty |= all.remove(*key).is_some();
        }
        if dirty {
            self.write_all(&all)?;
            debug!(keys = keys.len(), "Storage entries removed");
        }
        Ok(())
    }
}

/// In-process storage. Nothing survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Memory storage lock poisoned"))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut all = self.entries()?;
        for (key, value) in entries {
            all.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut all = self.entries()?;
        for key in keys {
            all.remove(*key);
        }
        Ok(())
    }
}
