//! Common types used throughout OnceLink.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;
use zeroize::Zeroize;

use crate::token::TOKEN_SEPARATOR;

/// Upper bound on a secret's lifetime unless configured otherwise (two weeks).
pub const MAX_TTL_SECONDS: u64 = 1_209_600;

/// TTL applied when a create request does not name one.
pub const DEFAULT_TTL_SECONDS: u64 = 1_209_600;

/// Named durations accepted by the legacy API.
pub const NAMED_DURATIONS: [(&str, u64); 4] = [
    ("hour", 3_600),
    ("day", 86_400),
    ("week", 604_800),
    ("two weeks", 1_209_600),
];

/// Time-to-live of a stored secret, in whole seconds.
///
/// Always positive. The upper bound is a deployment setting, so it is
/// checked at construction rather than encoded in the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ttl(u64);

impl Ttl {
    /// Create a TTL from seconds.
    ///
    /// # Errors
    /// - `Validation` on `ttl` if `secs` is zero or exceeds `max_secs`
    pub fn new(secs: u64, max_secs: u64) -> crate::Result<Self> {
        if secs == 0 {
            return Err(crate::Error::invalid_param(
                "ttl",
                "The TTL must be a positive number of seconds.",
            ));
        }
        if secs > max_secs {
            return Err(crate::Error::invalid_param(
                "ttl",
                "The specified TTL is longer than the maximum supported.",
            ));
        }
        Ok(Self(secs))
    }

    /// Resolve a legacy named duration such as `"day"` or `"Two Weeks"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_lowercase();
        NAMED_DURATIONS
            .iter()
            .find(|(label, _)| *label == wanted)
            .map(|(_, secs)| Self(*secs))
    }

    /// Seconds until expiry.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// The TTL as a `Duration`.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl fmt::Display for Ttl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Key under which one secret's ciphertext is stored.
///
/// Generated keys are a fixed prefix followed by a random UUID, so the
/// backing store can be shared with other tenants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageKey(String);

impl StorageKey {
    /// Generate a fresh, never reused key under `prefix`.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}{}", prefix, Uuid::new_v4().simple()))
    }

    /// Wrap an existing key, e.g. one decoded from a token.
    ///
    /// # Errors
    /// - Returns error if `key` is empty
    pub fn new(key: impl Into<String>) -> crate::Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(crate::Error::InvalidInput(
                "StorageKey cannot be empty".to_string(),
            ));
        }
        Ok(Self(key))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that a storage key prefix can round-trip through a token.
pub fn validate_key_prefix(prefix: &str) -> crate::Result<()> {
    if prefix.contains(TOKEN_SEPARATOR) {
        return Err(crate::Error::InvalidInput(format!(
            "Key prefix cannot contain the token separator '{}'",
            TOKEN_SEPARATOR
        )));
    }
    Ok(())
}

/// One offending field of a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidParam {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InvalidParam {
    /// Create a param entry without a reason.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: None,
        }
    }

    /// Attach a human readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Plaintext secret that zeroizes on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct SecretText(String);

impl SecretText {
    /// Wrap a plaintext secret.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Decode plaintext bytes.
    ///
    /// # Errors
    /// - `Serialization` if the bytes are not UTF-8
    pub fn from_utf8(bytes: Vec<u8>) -> crate::Result<Self> {
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|_| crate::Error::Serialization("Secret is not valid UTF-8".to_string()))
    }

    /// Borrow the plaintext.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretText([REDACTED; {} bytes])", self.0.len())
    }
}
