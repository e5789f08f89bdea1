//! Problem objects (`application/problem+json`).

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};
use serde::Serialize;

use crate::links::BaseUrl;
use oncelink_common::InvalidParam;

/// Media type of problem responses.
pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

/// Structured error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    #[serde(rename = "invalid-params")]
    pub invalid_params: Vec<InvalidParam>,
    #[serde(skip)]
    pub status: StatusCode,
}

impl Problem {
    /// Create-request validation failure (400).
    pub fn validation(base: &BaseUrl, invalid_params: Vec<InvalidParam>) -> Self {
        Self {
            type_url: base.join("set-password-validation-error"),
            title: "The password and/or the TTL are invalid.".to_string(),
            invalid_params,
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Secret missing, expired, consumed, or not decryptable (404).
    pub fn not_found(base: &BaseUrl) -> Self {
        Self {
            type_url: base.join("get-password-error"),
            title: "The password doesn't exist.".to_string(),
            invalid_params: vec![InvalidParam::new("token")],
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut response = (status, Json(self)).into_response();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(PROBLEM_CONTENT_TYPE));
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use serde_json::json;

    fn base() -> BaseUrl {
        BaseUrl::resolve(&ServerConfig::default(), Some("example.com"))
    }

    #[test]
    fn test_validation_problem_body() {
        let problem = Problem::validation(&base(), vec![InvalidParam::new("ttl").with_reason("too long")]);

        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            serde_json::to_value(&problem).unwrap(),
            json!({
                "type": "https://example.com/set-password-validation-error",
                "title": "The password and/or the TTL are invalid.",
                "invalid-params": [{ "name": "ttl", "reason": "too long" }]
            })
        );
    }

    #[test]
    fn test_not_found_problem_body() {
        let problem = Problem::not_found(&base());

        assert_eq!(problem.status, StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&problem).unwrap(),
            json!({
                "type": "https://example.com/get-password-error",
                "title": "The password doesn't exist.",
                "invalid-params": [{ "name": "token" }]
            })
        );
    }

    #[test]
    fn test_response_content_type() {
        let response = Problem::not_found(&base()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], PROBLEM_CONTENT_TYPE);
    }
}
