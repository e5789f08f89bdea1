//! Per-secret symmetric keys.
//!
//! A key is generated for every stored secret and handed back to the caller
//! inside the retrieval token. The server never keeps a copy.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chacha20poly1305::{
    aead::{KeyInit, OsRng},
    XChaCha20Poly1305,
};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use oncelink_common::{Error, Result};

/// Length of encryption keys in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Symmetric key for one secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; KEY_LENGTH],
}

impl SecretKey {
    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let generated = XChaCha20Poly1305::generate_key(&mut OsRng);
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&generated);
        Self { key }
    }

    /// Create a key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }

    /// Encode as unpadded URL-safe base64, the form carried in tokens.
    pub fn to_token_string(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.key)
    }

    /// Parse the token form of a key.
    ///
    /// # Errors
    /// - `Decryption` if the text is not base64 or has the wrong length.
    ///   A bad key is reported the same way as a wrong one.
    pub fn from_token_str(text: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(text.as_bytes())
                .map_err(|_| Error::Decryption)?,
        );
        if decoded.len() != KEY_LENGTH {
            return Err(Error::Decryption);
        }

        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&decoded);
        Ok(Self { key })
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey([REDACTED])")
    }
}
