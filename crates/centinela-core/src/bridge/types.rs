//! Wire types for the bridge's line-delimited JSON protocol.
//!
//! The bridge emits one JSON object per stdout line. Every lifecycle and
//! acknowledgment event shares the same envelope; the `event` discriminator
//! decides which optional fields are meaningful.
//!
//! Examples:
//!
//! ```json
//! {"event":"pairing","code":"2@HhX..."}
//! {"event":"authenticated","identity":"573001112222"}
//! {"event":"ready"}
//! {"event":"auth_failure","reason":"pairing code expired"}
//! {"event":"disconnected","reason":"surface logout"}
//! {"event":"send_result","id":"8f3a...","ok":true}
//! ```

use serde::{Deserialize, Serialize};

/// One parsed line of the bridge's stdout stream.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeStreamEvent {
    /// The event discriminator ("pairing", "authenticated", "ready", ...).
    pub event: String,

    /// Pairing challenge, for "pairing" events.
    #[serde(default)]
    pub code: Option<String>,

    /// Authenticated identity, for "authenticated" events.
    #[serde(default)]
    pub identity: Option<String>,

    /// Human-readable cause, for "auth_failure" and "disconnected" events.
    #[serde(default)]
    pub reason: Option<String>,

    /// Correlation id, for "send_result" events.
    #[serde(default)]
    pub id: Option<String>,

    /// Whether the send was accepted, for "send_result" events.
    #[serde(default)]
    pub ok: Option<bool>,

    /// Failure detail, for rejected "send_result" events.
    #[serde(default)]
    pub error: Option<String>,
}

/// A `send` command written to the bridge's stdin.
#[derive(Debug, Clone, Serialize)]
pub struct SendCommand<'a> {
    pub cmd: &'static str,
    /// Correlation id echoed back in the matching "send_result".
    pub id: &'a str,
    pub to: &'a str,
    pub text: &'a str,
}

impl<'a> SendCommand<'a> {
    pub fn new(id: &'a str, to: &'a str, text: &'a str) -> Self {
        Self {
            cmd: "send",
            id,
            to,
            text,
        }
    }
}
