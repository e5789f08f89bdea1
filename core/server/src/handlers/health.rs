//! Liveness probe.

use axum::Json;
use serde_json::{json, Value};

/// `GET /health`: reaching the handler means the store answered the
/// liveness middleware.
pub async fn health() -> Json<Value> {
    Json(json!({}))
}
