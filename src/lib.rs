//! # clock-probe
//!
//! WebSocket timestamp-echo server used as a latency and clock-offset probe.
//!
//! A client connects and immediately receives `{"c":0,"ts":<now>}`. Every
//! text frame `{"c": N, ...}` it sends afterwards is answered with
//! `{"c":N,"ts":<now>}`, where `ts` is whole Unix seconds. Malformed frames
//! are logged and dropped without closing the connection.
//!
//! ## Architecture
//!
//! ```text
//! Clients (WebSocket)
//!     │
//!     ├── ProbeServer (server)      bind, router, serve
//!     ├── WS Handler (ws/handler)   upgrade on any path
//!     │
//!     └── Connection (ws/connection)
//!             ├── Event / parse_counter (ws/messages)
//!             └── Keepalive (ws/keepalive)
//! ```

pub mod app_state;
pub mod config;
pub mod error;
pub mod server;
pub mod ws;
