//! HTTP server configuration.

use serde::{Deserialize, Serialize};

/// How the server presents itself in generated links and problem types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Emit `http://` links instead of `https://`.
    pub no_ssl: bool,
    /// Host used in links instead of the request's `Host` header.
    pub host_override: Option<String>,
    /// Path prefix the service is published under, e.g. `secrets`.
    pub url_prefix: Option<String>,
    /// Attach a permissive CORS layer.
    pub cors: bool,
}

impl ServerConfig {
    /// Serve plain HTTP links.
    pub fn with_no_ssl(mut self, no_ssl: bool) -> Self {
        self.no_ssl = no_ssl;
        self
    }

    /// Pin the host used in links.
    pub fn with_host_override(mut self, host: impl Into<String>) -> Self {
        self.host_override = Some(host.into());
        self
    }

    /// Publish under a path prefix.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = Some(prefix.into());
        self
    }

    /// Enable or disable CORS.
    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// URL scheme for generated links.
    pub fn scheme(&self) -> &'static str {
        if self.no_ssl {
            "http"
        } else {
            "https"
        }
    }

    /// Path prefix without surrounding slashes, if one is set.
    pub fn prefix(&self) -> Option<&str> {
        self.url_prefix
            .as_deref()
            .map(|prefix| prefix.trim_matches('/'))
            .filter(|prefix| !prefix.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme() {
        assert_eq!(ServerConfig::default().scheme(), "https");
        assert_eq!(ServerConfig::default().with_no_ssl(true).scheme(), "http");
    }

    #[test]
    fn test_prefix_normalized() {
        let config = ServerConfig::default().with_url_prefix("/secrets/");
        assert_eq!(config.prefix(), Some("secrets"));
    }

    #[test]
    fn test_blank_prefix_ignored() {
        assert_eq!(ServerConfig::default().with_url_prefix("/").prefix(), None);
        assert_eq!(ServerConfig::default().prefix(), None);
    }
}
