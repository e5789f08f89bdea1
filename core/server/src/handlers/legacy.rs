//! Legacy create endpoint.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::parse_create_body;
use crate::error::ApiError;
use crate::links::BaseUrl;
use crate::state::AppState;
use oncelink_exchange::TtlPolicy;

/// Body of a legacy create response.
#[derive(Debug, Serialize)]
pub struct LegacyCreateResponse {
    pub link: String,
    pub ttl: u64,
}

/// `POST /v1/secret`: accepts named durations; any failure is a bare 500.
pub async fn create_secret(
    State(state): State<AppState>,
    base: BaseUrl,
    body: Bytes,
) -> Result<Json<LegacyCreateResponse>, ApiError> {
    let request = parse_create_body(&body).map_err(ApiError::legacy)?;
    let created = state
        .exchange
        .create_from_request(request, TtlPolicy::SecondsOrNamed)
        .await
        .map_err(ApiError::legacy)?;

    Ok(Json(LegacyCreateResponse {
        link: base.web_link(&created.token),
        ttl: created.ttl.as_secs(),
    }))
}
