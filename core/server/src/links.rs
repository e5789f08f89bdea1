//! Absolute URLs for links and problem types.

use axum::extract::FromRequestParts;
use http::header::HOST;
use http::request::Parts;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::convert::Infallible;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Characters left as-is when a token is embedded in a URL.
const TOKEN_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Host assumed when neither an override nor a `Host` header is present.
const FALLBACK_HOST: &str = "localhost";

/// Percent-encode a token for use as a single path segment.
pub fn encode_token(token: &str) -> String {
    utf8_percent_encode(token, TOKEN_SAFE).to_string()
}

/// Root URL of the service for the current request, always ending in `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Build from configuration and the request's `Host` header.
    pub fn resolve(config: &ServerConfig, request_host: Option<&str>) -> Self {
        let host = config
            .host_override
            .as_deref()
            .or(request_host)
            .unwrap_or(FALLBACK_HOST);

        let mut url = format!("{}://{}/", config.scheme(), host.trim_end_matches('/'));
        if let Some(prefix) = config.prefix() {
            url.push_str(prefix);
            url.push('/');
        }
        Self(url)
    }

    /// Get the URL string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL of a path relative to the service root.
    pub fn join(&self, relative: &str) -> String {
        format!("{}{}", self.0, relative.trim_start_matches('/'))
    }

    /// Link the recipient opens in a browser.
    pub fn web_link(&self, token: &str) -> String {
        self.join(&encode_token(token))
    }

    /// API resource link for a token.
    pub fn api_link(&self, token: &str) -> String {
        self.join(&format!("v2/secret/{}", encode_token(token)))
    }
}

impl FromRequestParts<AppState> for BaseUrl {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let host = parts.headers.get(HOST).and_then(|value| value.to_str().ok());
        Ok(Self::resolve(&state.config, host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_by_default_with_request_host() {
        let base = BaseUrl::resolve(&ServerConfig::default(), Some("example.com"));
        assert_eq!(base.as_str(), "https://example.com/");
    }

    #[test]
    fn test_no_ssl_with_override_and_prefix() {
        let config = ServerConfig::default()
            .with_no_ssl(true)
            .with_host_override("share.internal:8080")
            .with_url_prefix("/secrets/");

        let base = BaseUrl::resolve(&config, Some("ignored.example"));
        assert_eq!(base.as_str(), "http://share.internal:8080/secrets/");
    }

    #[test]
    fn test_missing_host_falls_back() {
        let base = BaseUrl::resolve(&ServerConfig::default(), None);
        assert_eq!(base.as_str(), "https://localhost/");
    }

    #[test]
    fn test_links() {
        let base = BaseUrl::resolve(&ServerConfig::default(), Some("example.com"));

        assert_eq!(base.web_link("abc~k-_y"), "https://example.com/abc~k-_y");
        assert_eq!(
            base.api_link("abc~key"),
            "https://example.com/v2/secret/abc~key"
        );
        assert_eq!(
            base.join("get-password-error"),
            "https://example.com/get-password-error"
        );
    }

    #[test]
    fn test_encode_token_escapes_reserved() {
        assert_eq!(encode_token("tenant:a/b~k+y"), "tenant%3Aa%2Fb~k%2By");
    }
}
