//! Secret endpoints of the v2 API.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::CACHE_CONTROL;
use http::StatusCode;
use serde::Serialize;

use super::{parse_create_body, Link};
use crate::error::ApiError;
use crate::links::BaseUrl;
use crate::state::AppState;
use oncelink_exchange::TtlPolicy;

/// Body of a create response.
#[derive(Debug, Serialize)]
pub struct CreateSecretResponse {
    pub token: String,
    pub ttl: u64,
    pub links: Vec<Link>,
}

/// Body of a retrieve response.
#[derive(Serialize)]
struct SecretResponse<'a> {
    password: &'a str,
}

/// `POST /v2/secret`
pub async fn create_secret(
    State(state): State<AppState>,
    base: BaseUrl,
    body: Bytes,
) -> Result<Json<CreateSecretResponse>, ApiError> {
    let request = parse_create_body(&body).map_err(|e| ApiError::problem(e, &base))?;
    let created = state
        .exchange
        .create_from_request(request, TtlPolicy::Seconds)
        .await
        .map_err(|e| ApiError::problem(e, &base))?;

    let links = vec![
        Link {
            rel: "self",
            href: base.api_link(&created.token),
        },
        Link {
            rel: "web-view",
            href: base.web_link(&created.token),
        },
    ];

    Ok(Json(CreateSecretResponse {
        token: created.token,
        ttl: created.ttl.as_secs(),
        links,
    }))
}

/// `GET /v2/secret/{token}`: returns the secret and destroys it.
pub async fn retrieve_secret(
    State(state): State<AppState>,
    base: BaseUrl,
    Path(token): Path<String>,
) -> Result<Response, ApiError> {
    let secret = state
        .exchange
        .retrieve(&token)
        .await
        .map_err(|e| ApiError::problem(e, &base))?;

    Ok((
        [(CACHE_CONTROL, "no-store")],
        Json(SecretResponse {
            password: secret.expose(),
        }),
    )
        .into_response())
}

/// `HEAD /v2/secret/{token}`: 200 if the secret is still there, else 404.
pub async fn probe_secret(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
    match state.exchange.exists(&token).await {
        Ok(true) => Ok(StatusCode::OK),
        Ok(false) => Err(ApiError::Status(StatusCode::NOT_FOUND)),
        Err(err) => Err(ApiError::status(err)),
    }
}
