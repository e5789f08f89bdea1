//! Encryption engine for OnceLink.
//!
//! This module provides:
//! - Per-secret key generation
//! - Authenticated encryption using XChaCha20-Poly1305
//! - A text form of keys suitable for embedding in retrieval tokens
//!
//! # Security Guarantees
//! - All key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged
//! - Decryption never returns unauthenticated data

pub mod aead;
pub mod keys;

pub use aead::{decrypt, encrypt};
pub use keys::{SecretKey, KEY_LENGTH};
