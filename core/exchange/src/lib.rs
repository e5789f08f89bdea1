//! One-time secret exchange.
//!
//! Ties the encryption engine, the token codec and a secret store together:
//! - `create`: encrypt under a fresh key, store the ciphertext under a fresh
//!   storage key, hand back `storage_key~key` as the token
//! - `retrieve`: split the token, destructively fetch, decrypt
//! - `exists`: non-destructive probe
//!
//! Request validation lives in [`validation`] and always runs before any
//! store or crypto call.

pub mod config;
pub mod exchange;
pub mod validation;

pub use config::ExchangeConfig;
pub use exchange::{CreatedSecret, SecretExchange};
pub use validation::{CreateSecretRequest, TtlInput, TtlPolicy, ValidatedSecret};
