//! Common utilities and types shared across OnceLink modules.
//!
//! This module provides the error taxonomy, the TTL and storage key types,
//! and the retrieval token codec.

pub mod error;
pub mod token;
pub mod types;

pub use error::{Error, Result};
pub use token::TOKEN_SEPARATOR;
pub use types::{
    validate_key_prefix, InvalidParam, SecretText, StorageKey, Ttl, DEFAULT_TTL_SECONDS,
    MAX_TTL_SECONDS, NAMED_DURATIONS,
};
