//! Secret store trait definition.

use async_trait::async_trait;
use std::time::Duration;

use oncelink_common::{Result, StorageKey};

/// TTL-bounded key-value store holding secret ciphertexts.
///
/// Implementations are shared across request handlers as
/// `Arc<dyn SecretStore>` and must be safe to call concurrently.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get the backend name (e.g., "memory", "sqlite").
    fn name(&self) -> &str;

    /// Store `value` until `ttl` has elapsed.
    ///
    /// # Preconditions
    /// - `key` is fresh; callers generate a new key for every put
    ///
    /// # Errors
    /// - `AlreadyExists` if a live record is already stored under `key`
    /// - `StoreUnavailable` if the backend cannot be reached
    async fn put(&self, key: &StorageKey, value: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Atomically read and remove the record under `key`.
    ///
    /// # Postconditions
    /// - Returns the value if the record was present and not expired
    /// - The record is gone afterwards
    /// - Of any number of concurrent calls for one key, at most one
    ///   observes the value
    ///
    /// # Errors
    /// - `StoreUnavailable` if the backend cannot be reached
    async fn fetch_and_delete(&self, key: &StorageKey) -> Result<Option<Vec<u8>>>;

    /// Check whether a live record exists, without consuming it or
    /// touching its expiry.
    async fn exists(&self, key: &StorageKey) -> Result<bool>;

    /// Probe backend reachability.
    async fn ping(&self) -> Result<()>;

    /// Remove every expired record and return how many were reclaimed.
    async fn purge_expired(&self) -> Result<usize>;
}
