//! Flag persistence service.
//!
//! The flag is one millisecond-since-epoch timestamp, stored as a decimal
//! string under the fixed key `"date"`. It is created on first save, read on
//! every bootstrap, and overwritten on every message from the application's
//! cache port. There is no history, versioning, or expiry.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

/// Storage key for the bootstrap flag.
pub const FLAG_KEY: &str = "date";

/// Key-value storage backend for the shell's persisted state.
pub trait Storage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Storage backed by one file per key inside a directory.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage entry: {}", key))?;
        Ok(Some(contents))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        std::fs::write(&path, value)
            .with_context(|| format!("Failed to write storage entry: {}", key))?;
        Ok(())
    }
}

/// In-memory storage backend for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Persistence service for the bootstrap flag.
///
/// `get` yields `None` for a missing, empty, non-numeric, or zero value;
/// the shell substitutes the current wall-clock time in that case. A stored
/// literal zero is treated the same as absent.
#[derive(Clone)]
pub struct FlagStore {
    storage: Arc<dyn Storage>,
}

impl FlagStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Read the persisted flag, if a usable one exists.
    pub fn get(&self) -> Result<Option<i64>> {
        let raw = self.storage.read(FLAG_KEY)?;
        Ok(raw.as_deref().and_then(Self::parse))
    }

    /// Overwrite the persisted flag with a new millisecond timestamp.
    pub fn set(&self, millis: i64) -> Result<()> {
        self.storage.write(FLAG_KEY, &millis.to_string())
    }

    fn parse(raw: &str) -> Option<i64> {
        match raw.trim().parse::<i64>() {
            Ok(millis) if millis > 0 => Some(millis),
            Ok(_) => {
                debug!(value = raw, "stored flag is zero or negative, treating as absent");
                None
            }
            Err(_) => {
                debug!(value = raw, "stored flag is not numeric, treating as absent");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> (FlagStore, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::default());
        (FlagStore::new(storage.clone()), storage)
    }

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "clockshell-{}-{}-{}",
            name,
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    #[test]
    fn test_get_valid_value() {
        let (store, storage) = memory_store();
        storage.write(FLAG_KEY, "1700000000000").unwrap();
        assert_eq!(store.get().unwrap(), Some(1700000000000));
    }

    #[test]
    fn test_get_missing_value() {
        let (store, _) = memory_store();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_get_non_numeric_value() {
        let (store, storage) = memory_store();
        storage.write(FLAG_KEY, "yesterday").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_get_empty_value() {
        let (store, storage) = memory_store();
        storage.write(FLAG_KEY, "").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_zero_treated_as_absent() {
        let (store, storage) = memory_store();
        storage.write(FLAG_KEY, "0").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_negative_treated_as_absent() {
        let (store, storage) = memory_store();
        storage.write(FLAG_KEY, "-5").unwrap();
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_set_overwrites() {
        let (store, _) = memory_store();
        store.set(1700000000000).unwrap();
        store.set(1700000050000).unwrap();
        assert_eq!(store.get().unwrap(), Some(1700000050000));
    }

    #[test]
    fn test_file_storage_round_trip() {
        let storage = FileStorage::new(temp_dir("flag-round-trip")).unwrap();
        let store = FlagStore::new(Arc::new(storage));
        store.set(1700000000000).unwrap();
        assert_eq!(store.get().unwrap(), Some(1700000000000));
    }

    #[test]
    fn test_file_storage_decimal_string_on_disk() {
        let dir = temp_dir("flag-format");
        let storage = FileStorage::new(dir.clone()).unwrap();
        FlagStore::new(Arc::new(storage)).set(1700000000000).unwrap();

        let on_disk = std::fs::read_to_string(dir.join(FLAG_KEY)).unwrap();
        assert_eq!(on_disk, "1700000000000");
    }
}
