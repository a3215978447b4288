//! Axum WebSocket upgrade handler.

use std::net::SocketAddr;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;

/// `GET /` (or any path) — Upgrade HTTP connection to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let keepalive = state.keepalive;

    ws.on_failed_upgrade(move |e| {
        tracing::error!(%peer, error = %e, "websocket upgrade failed");
    })
    .on_upgrade(move |socket| run_connection(socket, peer, keepalive))
}
