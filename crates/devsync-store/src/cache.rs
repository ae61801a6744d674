//! Device key/value cache.
//!
//! Opaque string entries keyed by the names in
//! [`devsync_shared::constants::keys`]. The auth session mirrors its state
//! here so a restart can restore the signed-in user without a round trip.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// String key/value storage local to the device.
pub trait DeviceCache: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;

    fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove_item(key)?;
        }
        Ok(())
    }
}

/// JSON helpers available on every [`DeviceCache`].
pub trait DeviceCacheExt: DeviceCache {
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }
}

impl<C: DeviceCache + ?Sized> DeviceCacheExt for C {}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-lifetime cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DeviceCache for MemoryCache {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SQLite
// ---------------------------------------------------------------------------

/// Cache persisted in a local SQLite file.
pub struct SqliteCache {
    db: Mutex<Database>,
}

impl SqliteCache {
    /// Open the cache in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Ok(Self::from_database(Database::new()?))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self::from_database(Database::open_at(path)?))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_database(Database::open_in_memory()?))
    }

    pub fn from_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }
}

impl DeviceCache for SqliteCache {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        db.kv_get(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        db.kv_set(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        db.kv_remove(key)?;
        Ok(())
    }

    fn multi_remove(&self, keys: &[&str]) -> Result<()> {
        let mut db = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        let removed = db.kv_remove_many(keys)?;
        tracing::debug!(requested = keys.len(), removed, "cache entries removed");
        Ok(())
    }
}
