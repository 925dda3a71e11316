//! Operator-facing signal broadcasting.
//!
//! The [`SignalBus`] is the pluggable sink the core emits its raw signals
//! through: pairing challenges, session state changes and delivery outcomes.
//! The core never decides how a signal is presented; consumers (a terminal
//! renderer, a log forwarder, a webhook, tests) subscribe and render.
//!
//! # Example
//!
//! ```rust
//! use centinela_core::event_bus::{NotifierSignal, SignalBus};
//!
//! let bus = SignalBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.emit(NotifierSignal::PairingIssued {
//!     code: "2@abc".to_string(),
//! });
//!
//! // Receive the signal (in async context)
//! // let signal = rx.recv().await.unwrap();
//! ```

use crate::dispatch::DeliveryOutcome;
use crate::session::SessionState;
use serde::Serialize;
use tokio::sync::broadcast;

/// Default channel capacity. Slow subscribers beyond this lag and miss
/// signals rather than blocking the emitter.
const DEFAULT_CAPACITY: usize = 256;

/// A signal emitted by the notification core.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "signal", rename_all = "camelCase")]
pub enum NotifierSignal {
    /// A pairing challenge was issued. A later `PairingIssued` supersedes
    /// this one; only the newest code is worth presenting.
    PairingIssued { code: String },
    /// The session state machine moved.
    StateChanged { state: SessionState },
    /// A notification request finished dispatching.
    DeliveryCompleted { outcome: DeliveryOutcome },
}

/// Broadcast bus for notifier signals.
///
/// Backed by a tokio broadcast channel so multiple consumers receive the
/// same signals concurrently. Emitting with no subscribers is legal and
/// drops the signal.
pub struct SignalBus {
    sender: broadcast::Sender<NotifierSignal>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit a signal to all subscribers.
    ///
    /// Returns the number of subscribers that received it; 0 when nobody is
    /// listening. Never blocks.
    pub fn emit(&self, signal: NotifierSignal) -> usize {
        self.sender.send(signal).unwrap_or(0)
    }

    /// Subscribe to all future signals. Past signals are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<NotifierSignal> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}
