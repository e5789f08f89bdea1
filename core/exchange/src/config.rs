//! Exchange configuration.

use serde::{Deserialize, Serialize};

use oncelink_common::{
    validate_key_prefix, Error, Result, Ttl, DEFAULT_TTL_SECONDS, MAX_TTL_SECONDS,
};

/// Default namespace for storage keys.
pub const DEFAULT_KEY_PREFIX: &str = "oncelink";

/// Default upper bound on a secret's size in bytes.
pub const DEFAULT_MAX_SECRET_BYTES: usize = 64 * 1024;

/// Settings shared by every exchange operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Prefix prepended to every generated storage key.
    pub key_prefix: String,
    /// Longest TTL a caller may request, in seconds.
    pub max_ttl_secs: u64,
    /// Largest accepted secret, in bytes.
    pub max_secret_bytes: usize,
}

impl ExchangeConfig {
    /// Set the storage key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the maximum TTL.
    pub fn with_max_ttl_secs(mut self, secs: u64) -> Self {
        self.max_ttl_secs = secs;
        self
    }

    /// Set the maximum secret size.
    pub fn with_max_secret_bytes(mut self, bytes: usize) -> Self {
        self.max_secret_bytes = bytes;
        self
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    /// - `InvalidInput` if the prefix contains the token separator
    /// - `InvalidInput` if a limit is zero
    pub fn validate(&self) -> Result<()> {
        validate_key_prefix(&self.key_prefix)?;
        if self.max_ttl_secs == 0 {
            return Err(Error::InvalidInput("Maximum TTL must be positive".to_string()));
        }
        if self.max_secret_bytes == 0 {
            return Err(Error::InvalidInput(
                "Maximum secret size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// TTL used when a request names none, clamped to the maximum.
    pub fn default_ttl(&self) -> Result<Ttl> {
        Ttl::new(DEFAULT_TTL_SECONDS.min(self.max_ttl_secs), self.max_ttl_secs)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            max_ttl_secs: MAX_TTL_SECONDS,
            max_secret_bytes: DEFAULT_MAX_SECRET_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ExchangeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.default_ttl().unwrap().as_secs(), 1_209_600);
    }

    #[test]
    fn test_default_ttl_clamped_to_maximum() {
        let config = ExchangeConfig::default().with_max_ttl_secs(3600);
        assert_eq!(config.default_ttl().unwrap().as_secs(), 3600);
    }

    #[test]
    fn test_prefix_with_separator_is_invalid() {
        let config = ExchangeConfig::default().with_key_prefix("a~b");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_limits_are_invalid() {
        assert!(ExchangeConfig::default().with_max_ttl_secs(0).validate().is_err());
        assert!(ExchangeConfig::default().with_max_secret_bytes(0).validate().is_err());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: ExchangeConfig =
            serde_json::from_str(r#"{"key_prefix": "tenant-a:"}"#).unwrap();
        assert_eq!(config.key_prefix, "tenant-a:");
        assert_eq!(config.max_ttl_secs, MAX_TTL_SECONDS);
    }
}
