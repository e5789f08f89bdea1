//! Secret store abstraction for OnceLink.
//!
//! This module provides a trait-based interface over TTL-bounded key-value
//! backends and a registry for resolving a backend by name.
//!
//! # Design Principles
//! - Destructive reads: `fetch_and_delete` is a single atomic operation in
//!   every backend, never a read followed by a delete
//! - Expired and consumed records look the same to callers
//! - Backend failures surface as `StoreUnavailable`, never as panics

pub mod memory;
pub mod registry;
pub mod sqlite;
pub mod store;

pub use memory::MemoryStore;
pub use registry::{create_default_registry, StoreRegistry};
pub use sqlite::SqliteStore;
pub use store::SecretStore;
