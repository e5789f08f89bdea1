//! HTTP surface for OnceLink.
//!
//! Routes:
//! - `POST /v1/secret`: legacy create, named TTLs, bare 500 on any failure
//! - `POST /v2/secret`: create, problem objects on validation failure
//! - `GET /v2/secret/{token}`: destructive read
//! - `HEAD /v2/secret/{token}`: non-destructive existence probe
//! - `GET /health`: store liveness
//!
//! Every route sits behind a store liveness check.

pub mod config;
pub mod error;
pub mod handlers;
pub mod links;
pub mod middleware;
pub mod problem;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use problem::Problem;
pub use routes::{build_router, serve};
pub use state::AppState;
