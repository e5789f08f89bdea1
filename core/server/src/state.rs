//! Shared handler state.

use std::sync::Arc;

use crate::config::ServerConfig;
use oncelink_exchange::SecretExchange;

/// State cloned into every request handler.
#[derive(Clone)]
pub struct AppState {
    pub exchange: Arc<SecretExchange>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create handler state.
    pub fn new(exchange: Arc<SecretExchange>, config: ServerConfig) -> Self {
        Self {
            exchange,
            config: Arc::new(config),
        }
    }
}
