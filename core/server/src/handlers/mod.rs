//! Request handlers.

pub mod health;
pub mod legacy;
pub mod secrets;

use serde::Serialize;
use tracing::debug;

use oncelink_common::{Error, Result};
use oncelink_exchange::CreateSecretRequest;

const BODY_REASON: &str =
    "The request body must be a JSON object with a string 'password' and an optional 'ttl'.";

/// Decode a create request body into its typed schema.
///
/// # Errors
/// - `Validation` on `body` if the payload is not JSON of the expected shape
pub(crate) fn parse_create_body(body: &[u8]) -> Result<CreateSecretRequest> {
    // serde_json messages can quote the offending value, so only its
    // position is logged.
    serde_json::from_slice(body).map_err(|e| {
        debug!(
            "Rejected create body: {:?} error at line {} column {}",
            e.classify(),
            e.line(),
            e.column()
        );
        Error::invalid_param("body", BODY_REASON)
    })
}

/// Hypermedia link in a create response.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    pub rel: &'static str,
    pub href: String,
}
