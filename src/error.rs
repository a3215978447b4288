//! Error types for the probe server.
//!
//! [`ProbeError`] covers both server-scope failures (binding, serving) and
//! the per-frame failures raised while decoding inbound messages. Frame
//! errors are never sent back to the client; the connection task logs them
//! and carries on.

use std::net::SocketAddr;

/// Central error enum for the probe server.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The listener could not be bound to the configured address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server attempted to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The accept loop terminated with an I/O error.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    /// Configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Inbound text frame is not valid JSON.
    #[error("malformed JSON: {0}")]
    MalformedJson(#[source] serde_json::Error),

    /// Inbound JSON is valid but not an object.
    #[error("expected a JSON object")]
    NotAnObject,

    /// Inbound object has no `c` field.
    #[error("missing counter field `c`")]
    MissingCounter,

    /// The `c` field is not an integer in 32-bit signed range.
    #[error("invalid counter: {0}")]
    InvalidCounter(String),

    /// Outbound frame could not be written to the peer.
    #[error("failed to send frame: {0}")]
    Send(#[source] axum::Error),

    /// Outbound event could not be serialised.
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProbeError {
    /// Returns `true` for errors caused by a single inbound frame.
    ///
    /// These are logged and dropped; the connection stays open.
    #[must_use]
    pub const fn is_frame_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson(_) | Self::NotAnObject | Self::MissingCounter | Self::InvalidCounter(_)
        )
    }
}
