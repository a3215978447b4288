//! Per-connection connection-lost detection.
//!
//! Every interval the connection task asks the [`Keepalive`] what to do.
//! A peer that has sent nothing (not even a pong) for one and a half
//! intervals is considered lost; otherwise the task pings it.

use std::time::Duration;

use tokio::time::{Instant, Interval};

/// What the connection task should do on a keepalive tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepaliveAction {
    /// Peer is alive; send a ping to provoke a pong.
    Ping,
    /// Peer has been silent too long; close the connection.
    Lost,
}

/// Tracks the last time a frame arrived from the peer.
#[derive(Debug, Clone)]
pub struct Keepalive {
    interval: Duration,
    last_seen: Instant,
}

impl Keepalive {
    /// Creates a tracker for the given interval, treating `now` as the
    /// last time the peer was heard from.
    #[must_use]
    pub const fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_seen: now,
        }
    }

    /// Returns `true` if connection-lost detection is turned on.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Check interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Builds the tick schedule, first firing one interval after `now`.
    ///
    /// Returns `None` when detection is disabled or the first deadline is
    /// past what the clock can represent, in which case no tick ever fires.
    #[must_use]
    pub fn ticker(&self, now: Instant) -> Option<Interval> {
        if !self.is_enabled() {
            return None;
        }
        let start = now.checked_add(self.interval)?;
        Some(tokio::time::interval_at(start, self.interval))
    }

    /// Records that a frame of any kind arrived at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Decides the action for a tick occurring at `now`.
    #[must_use]
    pub fn on_tick(&self, now: Instant) -> KeepaliveAction {
        let grace = self.interval.saturating_mul(3) / 2;
        if now.saturating_duration_since(self.last_seen) > grace {
            KeepaliveAction::Lost
        } else {
            KeepaliveAction::Ping
        }
    }
}
