//! Mapping from exchange errors to HTTP responses.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::{debug, error};

use crate::links::BaseUrl;
use crate::problem::Problem;
use oncelink_common::Error;

/// Errors returned by HTTP handlers.
///
/// Internal failures collapse into a bare status code so no detail leaks.
#[derive(Debug)]
pub enum ApiError {
    /// Structured problem body.
    Problem(Problem),
    /// Status code with an empty body.
    Status(StatusCode),
}

impl ApiError {
    /// Map an error for endpoints that answer with problem objects.
    pub fn problem(err: Error, base: &BaseUrl) -> Self {
        match err {
            Error::Validation(params) => Self::Problem(Problem::validation(base, params)),
            err if err.is_not_found() => {
                debug!("Secret lookup failed: {}", err);
                Self::Problem(Problem::not_found(base))
            }
            err => Self::internal(err),
        }
    }

    /// Map an error for endpoints that answer with status codes only.
    pub fn status(err: Error) -> Self {
        if err.is_not_found() {
            Self::Status(StatusCode::NOT_FOUND)
        } else {
            Self::internal(err)
        }
    }

    /// Map an error for the legacy API, which reports every failure as 500.
    pub fn legacy(err: Error) -> Self {
        match err {
            Error::Validation(params) => {
                debug!("Legacy create rejected: {:?}", params);
                Self::Status(StatusCode::INTERNAL_SERVER_ERROR)
            }
            err => Self::internal(err),
        }
    }

    fn internal(err: Error) -> Self {
        match &err {
            Error::StoreUnavailable(_) => error!("Secret store unreachable: {}", err),
            _ => error!("Request failed: {}", err),
        }
        Self::Status(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Problem(problem) => problem.into_response(),
            Self::Status(status) => status.into_response(),
        }
    }
}
