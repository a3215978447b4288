//! WebSocket layer: upgrade handling, connection lifecycle, wire messages.
//!
//! Every connection receives a hello event (`c = 0`) on open and one
//! `{"c", "ts"}` reply per well-formed inbound frame.

pub mod connection;
pub mod handler;
pub mod keepalive;
pub mod messages;
