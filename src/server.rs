//! Listener bootstrap and router composition.

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::error::ProbeError;
use crate::ws::handler::ws_handler;

/// Builds the router. The WebSocket endpoint answers on every path.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .fallback(ws_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A bound probe server, ready to accept connections.
#[derive(Debug)]
pub struct ProbeServer {
    listener: TcpListener,
    state: AppState,
}

impl ProbeServer {
    /// Binds the listener described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Bind`] if the address cannot be bound.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ProbeError> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(addr).await.map_err(|source| {
            tracing::error!(%addr, error = %source, "failed to bind listener");
            ProbeError::Bind { addr, source }
        })?;

        Ok(Self {
            listener,
            state: AppState::from(config),
        })
    }

    /// Address the listener is actually bound to.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Serve`] if the socket address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ProbeError> {
        self.listener.local_addr().map_err(ProbeError::Serve)
    }

    /// Serves connections until the process is terminated.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Serve`] if the accept loop fails.
    pub async fn run(self) -> Result<(), ProbeError> {
        self.run_until(std::future::pending()).await
    }

    /// Serves connections until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Serve`] if the accept loop fails.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), ProbeError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.local_addr()?;
        tracing::info!("Server started on port: {}", addr.port());
        if self.state.keepalive.is_zero() {
            tracing::info!("connection-lost detection disabled");
        } else {
            tracing::info!(
                interval_secs = self.state.keepalive.as_secs(),
                "connection-lost detection enabled"
            );
        }

        let app = build_router(self.state);
        axum::serve(
            self.listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "server stopped");
            ProbeError::Serve(e)
        })
    }
}
