//! Store registry for resolving a backend by name.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::memory::MemoryStore;
use crate::sqlite::SqliteStore;
use crate::store::SecretStore;
use oncelink_common::{Error, Result};

type StoreFactory = fn(&Value) -> Result<Arc<dyn SecretStore>>;

/// Built-in store backends, keyed by the name used in configuration.
///
/// - `memory`: no configuration
/// - `sqlite`: `{"path": "<database file>"}`
pub struct StoreRegistry {
    factories: BTreeMap<&'static str, StoreFactory>,
}

impl StoreRegistry {
    /// Resolve a store by name and configuration.
    ///
    /// # Errors
    /// - `NotFound` if no backend has this name, listing the known ones
    /// - `InvalidInput` if the configuration is missing a field
    /// - `StoreUnavailable` if the backend could not be opened
    pub fn resolve(&self, name: &str, config: &Value) -> Result<Arc<dyn SecretStore>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::NotFound(format!(
                "Store '{}' is not registered (available: {})",
                name,
                self.stores().join(", ")
            ))
        })?;
        factory(config)
    }

    /// Get registered store names, sorted.
    pub fn stores(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

fn memory_store(_config: &Value) -> Result<Arc<dyn SecretStore>> {
    Ok(Arc::new(MemoryStore::new()))
}

fn sqlite_store(config: &Value) -> Result<Arc<dyn SecretStore>> {
    let path = config
        .get("path")
        .and_then(|v| v.as_str())
        .filter(|path| !path.is_empty())
        .ok_or_else(|| Error::InvalidInput("SQLite store requires a 'path'".to_string()))?;
    Ok(Arc::new(SqliteStore::open(path)?))
}

/// Create a registry with the built-in backends.
pub fn create_default_registry() -> StoreRegistry {
    let mut factories: BTreeMap<&'static str, StoreFactory> = BTreeMap::new();
    factories.insert("memory", memory_store);
    factories.insert("sqlite", sqlite_store);

    StoreRegistry { factories }
}
