//! Store liveness check run before every store-dependent route.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::StatusCode;
use tracing::error;

use crate::state::AppState;

/// Reject the request with 500 when the secret store does not answer.
pub async fn require_store(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state.exchange.ping().await {
        Ok(()) => next.run(request).await,
        Err(err) => {
            error!("Secret store unreachable: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
