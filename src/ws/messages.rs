//! WebSocket message types: the outbound event and inbound counter frame.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProbeError;

/// Counter value carried by the hello event.
pub const HELLO_COUNTER: i32 = 0;

/// Event sent to the client: a counter paired with the server time.
///
/// ```json
/// {"c": 7, "ts": 1700000000}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Counter being acknowledged, echoed verbatim from the client.
    pub c: i32,
    /// Unix epoch seconds at the moment the event was built.
    pub ts: i64,
}

impl Event {
    /// Builds an event for counter `c` stamped with the current time.
    #[must_use]
    pub fn now(c: i32) -> Self {
        Self {
            c,
            ts: unix_seconds(),
        }
    }

    /// The event sent immediately after a connection opens.
    #[must_use]
    pub fn hello() -> Self {
        Self::now(HELLO_COUNTER)
    }

    /// Serialises the event as compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Encode`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, ProbeError> {
        serde_json::to_string(self).map_err(ProbeError::Encode)
    }
}

/// Current wall-clock time in whole seconds since the Unix epoch.
#[must_use]
pub fn unix_seconds() -> i64 {
    Utc::now().timestamp()
}

/// Extracts the counter `c` from an inbound text frame.
///
/// Only `c` is read; every other field is ignored. The value must be a JSON
/// integer that fits in an `i32`. Floats, even integral ones like `3.0`, are
/// rejected.
///
/// # Errors
///
/// - [`ProbeError::MalformedJson`] if `text` is not JSON.
/// - [`ProbeError::NotAnObject`] if the JSON is not an object.
/// - [`ProbeError::MissingCounter`] if there is no `c` field.
/// - [`ProbeError::InvalidCounter`] if `c` is not an `i32` integer.
pub fn parse_counter(text: &str) -> Result<i32, ProbeError> {
    let value: Value = serde_json::from_str(text).map_err(ProbeError::MalformedJson)?;
    let Value::Object(fields) = value else {
        return Err(ProbeError::NotAnObject);
    };
    let c = fields.get("c").ok_or(ProbeError::MissingCounter)?;

    c.as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| ProbeError::InvalidCounter(c.to_string()))
}
