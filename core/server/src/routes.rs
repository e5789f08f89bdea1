//! Router assembly and serving.

use axum::body::Body;
use axum::routing::{get, post};
use axum::{middleware, Router};
use http::Request;
use std::borrow::Cow;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Span};

use crate::handlers::{health, legacy, secrets};
use crate::middleware::require_store;
use crate::state::AppState;
use oncelink_common::Result;

/// Build the application router.
///
/// When a URL prefix is configured the routes answer both at the root and
/// under the prefix, so the service works behind a path-stripping proxy as
/// well as a path-preserving one.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/v1/secret", post(legacy::create_secret))
        .route("/v2/secret", post(secrets::create_secret))
        .route(
            "/v2/secret/{token}",
            get(secrets::retrieve_secret).head(secrets::probe_secret),
        )
        .route("/health", get(health::health))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_store));

    let mut router = match state.config.prefix() {
        Some(prefix) => api.clone().nest(&format!("/{}", prefix), api),
        None => api,
    };

    if state.config.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Routes whose paths carry no token.
const STATIC_ROUTES: [&str; 3] = ["/health", "/v1/secret", "/v2/secret"];

/// Span for one request.
///
/// Tokens embed the decryption key, so the URI is never recorded as-is.
fn request_span(request: &Request<Body>) -> Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %redact_path(request.uri().path()),
        version = ?request.version(),
    )
}

/// Replace the last path segment with `{token}` unless the path is a
/// static route. Query strings are dropped by the caller.
fn redact_path(path: &str) -> Cow<'_, str> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() || STATIC_ROUTES.iter().any(|route| trimmed.ends_with(route)) {
        return Cow::Borrowed(path);
    }

    match trimmed.rfind('/') {
        Some(at) => Cow::Owned(format!("{}{{token}}", &trimmed[..=at])),
        None => Cow::Borrowed("{token}"),
    }
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// # Errors
/// - `Io` if the listener fails
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Listening on http://{}", addr);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_token_paths() {
        assert_eq!(redact_path("/v2/secret/oncelinkab12~c2VjcmV0"), "/v2/secret/{token}");
        assert_eq!(
            redact_path("/secrets/v2/secret/oncelinkab12~c2VjcmV0"),
            "/secrets/v2/secret/{token}"
        );
        assert_eq!(redact_path("/oncelinkab12~c2VjcmV0"), "/{token}");
        assert_eq!(redact_path("/v2/secret/oncelinkab12~c2VjcmV0/"), "/v2/secret/{token}");
    }

    #[test]
    fn test_static_routes_kept() {
        assert_eq!(redact_path("/health"), "/health");
        assert_eq!(redact_path("/v1/secret"), "/v1/secret");
        assert_eq!(redact_path("/secrets/v2/secret"), "/secrets/v2/secret");
        assert_eq!(redact_path("/"), "/");
    }
}
