//! WebSocket connection lifecycle.
//!
//! Handles the read/write loop for a single WebSocket connection: the hello
//! event on open, one reply per well-formed inbound frame, keepalive pings,
//! and the disconnect log on close.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, close_code};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::time::{Instant, Interval};
use tracing::Instrument;

use super::keepalive::{Keepalive, KeepaliveAction};
use super::messages::{Event, parse_counter};
use crate::error::ProbeError;

type WsSink = SplitSink<WebSocket, Message>;

/// How a connection ended, as reported in the disconnect log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    /// Close code sent or received.
    pub code: u16,
    /// Close reason sent or received.
    pub reason: String,
    /// Whether the peer initiated the close.
    pub remote: bool,
}

impl Disconnect {
    fn remote(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self {
                code: frame.code,
                reason: frame.reason.as_str().to_owned(),
                remote: true,
            },
            None => Self {
                code: close_code::ABNORMAL,
                reason: String::new(),
                remote: true,
            },
        }
    }

    fn local(code: u16, reason: &str) -> Self {
        Self {
            code,
            reason: reason.to_owned(),
            remote: false,
        }
    }
}

/// Runs a single WebSocket connection until it closes.
///
/// The hello event is written before anything is read, so it is always the
/// first outbound frame.
pub async fn run_connection(socket: WebSocket, peer: SocketAddr, keepalive: Duration) {
    let conn_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("ws", conn = %conn_id, %peer);

    async move {
        tracing::debug!("ws connection opened");
        let disconnect = drive(socket, keepalive).await;
        tracing::info!(
            code = disconnect.code,
            reason = %disconnect.reason,
            remote = disconnect.remote,
            "{peer} has left"
        );
    }
    .instrument(span)
    .await;
}

async fn drive(socket: WebSocket, interval: Duration) -> Disconnect {
    let (mut ws_tx, mut ws_rx) = socket.split();

    if let Err(e) = send_event(&mut ws_tx, Event::hello()).await {
        tracing::warn!(error = %e, "failed to send hello event");
        return Disconnect::local(close_code::ABNORMAL, "hello not delivered");
    }

    let mut keepalive = Keepalive::new(interval, Instant::now());
    let mut ticker = keepalive.ticker(Instant::now());

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                let msg = match msg {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "ws transport error");
                        return Disconnect::local(close_code::ABNORMAL, "transport error");
                    }
                    None => return Disconnect::remote(None),
                };
                keepalive.touch(Instant::now());

                match msg {
                    Message::Text(text) => match reply_to(text.as_str()) {
                        Ok(json) => {
                            if let Err(e) = ws_tx.send(Message::text(json)).await {
                                tracing::debug!(error = %e, "reply discarded, peer gone");
                                return Disconnect::local(close_code::ABNORMAL, "send failed");
                            }
                        }
                        Err(e) if e.is_frame_error() => {
                            tracing::warn!(error = %e, "ignoring inbound frame");
                        }
                        Err(e) => tracing::error!(error = %e, "failed to build reply"),
                    },
                    Message::Close(frame) => return Disconnect::remote(frame),
                    // Pings are answered by the transport; binary frames carry nothing for us.
                    Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
                }
            }
            () = tick(ticker.as_mut()) => match keepalive.on_tick(Instant::now()) {
                KeepaliveAction::Ping => {
                    if ws_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                        return Disconnect::local(close_code::ABNORMAL, "ping failed");
                    }
                }
                KeepaliveAction::Lost => {
                    tracing::warn!(interval_secs = interval.as_secs(), "connection lost, no pong received");
                    let frame = CloseFrame {
                        code: close_code::AWAY,
                        reason: Utf8Bytes::from_static("connection lost"),
                    };
                    if let Err(e) = ws_tx.send(Message::Close(Some(frame))).await {
                        tracing::debug!(error = %e, "close frame discarded, peer gone");
                    }
                    return Disconnect::local(close_code::AWAY, "connection lost");
                }
            },
        }
    }
}

/// Waits for the next keepalive tick, or forever if keepalive is disabled.
async fn tick(ticker: Option<&mut Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn send_event(ws_tx: &mut WsSink, event: Event) -> Result<(), ProbeError> {
    let json = event.to_json()?;
    ws_tx
        .send(Message::text(json))
        .await
        .map_err(ProbeError::Send)
}

/// Builds the JSON reply for an inbound text frame.
fn reply_to(text: &str) -> Result<String, ProbeError> {
    let c = parse_counter(text)?;
    Event::now(c).to_json()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn reply_echoes_counter() {
        let Ok(json) = reply_to(r#"{"c": 7}"#) else {
            panic!("expected reply");
        };
        let Ok(event) = serde_json::from_str::<Event>(&json) else {
            panic!("reply is not an event: {json}");
        };
        assert_eq!(event.c, 7);
    }

    #[test]
    fn reply_drops_extra_fields() {
        let Ok(json) = reply_to(r#"{"c": 3, "payload": "ignored"}"#) else {
            panic!("expected reply");
        };
        assert!(!json.contains("payload"));
        assert!(json.contains(r#""c":3"#));
    }

    #[test]
    fn malformed_frame_has_no_reply() {
        let Err(err) = reply_to("not json") else {
            panic!("expected error");
        };
        assert!(err.is_frame_error());
    }

    #[test]
    fn disconnect_without_close_frame_is_abnormal() {
        let d = Disconnect::remote(None);
        assert_eq!(d.code, close_code::ABNORMAL);
        assert!(d.remote);
    }

    #[test]
    fn disconnect_keeps_peer_close_frame() {
        let d = Disconnect::remote(Some(CloseFrame {
            code: close_code::NORMAL,
            reason: Utf8Bytes::from_static("bye"),
        }));
        assert_eq!(d.code, close_code::NORMAL);
        assert_eq!(d.reason, "bye");
    }

    #[tokio::test]
    async fn disabled_ticker_never_fires() {
        let fired = tokio::time::timeout(Duration::from_millis(20), tick(None)).await;
        assert!(fired.is_err());
    }
}
