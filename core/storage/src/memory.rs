//! In-memory secret store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::store::SecretStore;
use oncelink_common::{Error, Result, StorageKey};

/// In-memory storage entry.
#[derive(Debug)]
struct Entry {
    data: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-memory secret store.
///
/// All records live in one mutex-guarded map, so a destructive read is a
/// single `remove` under the lock. Data is lost on drop, which makes this
/// backend suitable for single-process deployments and tests.
pub struct MemoryStore {
    storage: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            storage: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>> {
        self.storage
            .lock()
            .map_err(|_| Error::StoreUnavailable("Memory store lock poisoned".to_string()))
    }

    /// Number of records held, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().map(|storage| storage.len()).unwrap_or(0)
    }

    /// Check if the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn put(&self, key: &StorageKey, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| Error::InvalidInput(format!("TTL out of range: {:?}", ttl)))?;

        let mut storage = self.lock()?;
        if storage.get(key.as_str()).is_some_and(|entry| entry.is_live(now)) {
            return Err(Error::AlreadyExists(format!("Key already stored: {}", key)));
        }

        storage.insert(
            key.as_str().to_string(),
            Entry {
                data: value,
                expires_at,
            },
        );
        debug!("Stored record {} for {:?}", key, ttl);

        Ok(())
    }

    async fn fetch_and_delete(&self, key: &StorageKey) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();
        let removed = self.lock()?.remove(key.as_str());

        Ok(match removed {
            Some(entry) if entry.is_live(now) => Some(entry.data),
            Some(_) => {
                debug!("Record {} had expired", key);
                None
            }
            None => None,
        })
    }

    async fn exists(&self, key: &StorageKey) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .lock()?
            .get(key.as_str())
            .is_some_and(|entry| entry.is_live(now)))
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let now = Instant::now();
        let mut storage = self.lock()?;

        let before = storage.len();
        storage.retain(|_, entry| entry.is_live(now));
        Ok(before - storage.len())
    }
}
