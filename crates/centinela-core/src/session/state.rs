//! Session lifecycle state machine.
//!
//! The transition logic is a pure function over `(state, event)`. The I/O
//! layer ([`super::manager::SessionManager`]) only feeds events in; it never
//! encodes lifecycle policy of its own.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the connection to the messaging surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Uninitialized,
    Initializing,
    AwaitingPairing,
    Authenticated,
    Ready,
    Disconnected,
    Failed,
}

impl SessionState {
    /// Whether direct sends are allowed.
    pub fn is_ready(self) -> bool {
        matches!(self, SessionState::Ready)
    }

    /// Whether a `start()` call should be a no-op: the session is already
    /// underway or operational.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            SessionState::Initializing
                | SessionState::AwaitingPairing
                | SessionState::Authenticated
                | SessionState::Ready
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Uninitialized => "uninitialized",
            SessionState::Initializing => "initializing",
            SessionState::AwaitingPairing => "awaiting-pairing",
            SessionState::Authenticated => "authenticated",
            SessionState::Ready => "ready",
            SessionState::Disconnected => "disconnected",
            SessionState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Inbound events driving the state machine.
///
/// Lifecycle events originate from the surface client; `StartRequested` and
/// `ShutdownRequested` from the manager's own entry points.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    StartRequested,
    /// A pairing challenge was issued. Reissues supersede silently.
    PairingIssued { code: String },
    Authenticated { identity: Option<String> },
    ConnectionReady,
    AuthFailed { reason: String },
    ConnectionLost { reason: String },
    ClientCrashed { detail: String },
    ShutdownRequested,
}

/// Pure transition function.
///
/// `ever_authenticated` is tracked by the manager for the current process
/// instance; it selects between `Disconnected` (a real session was lost,
/// re-arming may restore it) and `Failed` (pairing never completed, the
/// operator must intervene).
pub fn next_state(
    current: SessionState,
    event: &SessionEvent,
    ever_authenticated: bool,
) -> SessionState {
    use SessionState::*;

    match event {
        SessionEvent::StartRequested => match current {
            Uninitialized | Disconnected | Failed => Initializing,
            other => other,
        },
        SessionEvent::PairingIssued { .. } => match current {
            Initializing | AwaitingPairing => AwaitingPairing,
            other => other,
        },
        SessionEvent::Authenticated { .. } => match current {
            Initializing | AwaitingPairing => Authenticated,
            other => other,
        },
        // Readiness is only meaningful on top of a fresh authentication;
        // anything else is a protocol violation we ignore rather than act on.
        SessionEvent::ConnectionReady => match current {
            Authenticated => Ready,
            other => other,
        },
        SessionEvent::AuthFailed { .. }
        | SessionEvent::ConnectionLost { .. }
        | SessionEvent::ClientCrashed { .. } => match current {
            Uninitialized => Uninitialized,
            _ if ever_authenticated => Disconnected,
            _ => Failed,
        },
        SessionEvent::ShutdownRequested => Uninitialized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionState::*;

    fn lost() -> SessionEvent {
        SessionEvent::ConnectionLost {
            reason: "socket closed".to_string(),
        }
    }

    fn pairing() -> SessionEvent {
        SessionEvent::PairingIssued {
            code: "2@abc".to_string(),
        }
    }

    fn authenticated() -> SessionEvent {
        SessionEvent::Authenticated { identity: None }
    }

    #[test]
    fn happy_path_is_monotonic() {
        let mut state = Uninitialized;
        let mut ever = false;

        state = next_state(state, &SessionEvent::StartRequested, ever);
        assert_eq!(state, Initializing);

        state = next_state(state, &pairing(), ever);
        assert_eq!(state, AwaitingPairing);

        state = next_state(state, &authenticated(), ever);
        assert_eq!(state, Authenticated);
        ever = true;

        state = next_state(state, &SessionEvent::ConnectionReady, ever);
        assert_eq!(state, Ready);
    }

    #[test]
    fn start_is_a_no_op_while_active() {
        for state in [Initializing, AwaitingPairing, Authenticated, Ready] {
            assert_eq!(next_state(state, &SessionEvent::StartRequested, true), state);
        }
    }

    #[test]
    fn start_rearms_from_terminal_states() {
        assert_eq!(
            next_state(Disconnected, &SessionEvent::StartRequested, true),
            Initializing
        );
        assert_eq!(
            next_state(Failed, &SessionEvent::StartRequested, false),
            Initializing
        );
    }

    #[test]
    fn pairing_reissue_stays_awaiting() {
        let state = next_state(AwaitingPairing, &pairing(), false);
        assert_eq!(state, AwaitingPairing);
    }

    #[test]
    fn pairing_after_authentication_is_ignored() {
        assert_eq!(next_state(Authenticated, &pairing(), true), Authenticated);
        assert_eq!(next_state(Ready, &pairing(), true), Ready);
    }

    #[test]
    fn ready_only_follows_authenticated() {
        assert_eq!(
            next_state(Initializing, &SessionEvent::ConnectionReady, false),
            Initializing
        );
        assert_eq!(
            next_state(AwaitingPairing, &SessionEvent::ConnectionReady, false),
            AwaitingPairing
        );
    }

    #[test]
    fn loss_before_any_authentication_fails() {
        for state in [Initializing, AwaitingPairing] {
            assert_eq!(next_state(state, &lost(), false), Failed);
        }
        let crash = SessionEvent::ClientCrashed {
            detail: "bridge exited".to_string(),
        };
        assert_eq!(next_state(AwaitingPairing, &crash, false), Failed);
    }

    #[test]
    fn loss_after_authentication_disconnects() {
        for state in [Authenticated, Ready] {
            assert_eq!(next_state(state, &lost(), true), Disconnected);
        }
    }

    #[test]
    fn loss_after_rearm_of_a_previously_authenticated_session_disconnects() {
        // The process authenticated once, lost the session, re-armed, and the
        // new attempt was rejected. That is a Disconnected, not a Failed.
        let auth_failed = SessionEvent::AuthFailed {
            reason: "pairing rejected".to_string(),
        };
        assert_eq!(next_state(Initializing, &auth_failed, true), Disconnected);
    }

    #[test]
    fn loss_in_uninitialized_is_ignored() {
        assert_eq!(next_state(Uninitialized, &lost(), false), Uninitialized);
    }

    #[test]
    fn shutdown_resets_from_anywhere() {
        for state in [
            Uninitialized,
            Initializing,
            AwaitingPairing,
            Authenticated,
            Ready,
            Disconnected,
            Failed,
        ] {
            assert_eq!(
                next_state(state, &SessionEvent::ShutdownRequested, true),
                Uninitialized
            );
        }
    }

    #[test]
    fn only_ready_reports_ready() {
        assert!(Ready.is_ready());
        for state in [
            Uninitialized,
            Initializing,
            AwaitingPairing,
            Authenticated,
            Disconnected,
            Failed,
        ] {
            assert!(!state.is_ready());
        }
    }

    #[test]
    fn display_names() {
        assert_eq!(AwaitingPairing.to_string(), "awaiting-pairing");
        assert_eq!(Ready.to_string(), "ready");
    }

    #[test]
    fn state_serializes_camel_case() {
        let json = serde_json::to_string(&AwaitingPairing).unwrap();
        assert_eq!(json, "\"awaitingPairing\"");
    }
}
