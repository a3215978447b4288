//! Shared application state injected into the WebSocket handler.

use std::time::Duration;

use crate::config::ServerConfig;

/// Immutable state available to handlers via Axum's `State` extractor.
#[derive(Debug, Clone, Copy)]
pub struct AppState {
    /// Connection-lost check interval; zero disables it.
    pub keepalive: Duration,
}

impl From<&ServerConfig> for AppState {
    fn from(config: &ServerConfig) -> Self {
        Self {
            keepalive: config.keepalive,
        }
    }
}
