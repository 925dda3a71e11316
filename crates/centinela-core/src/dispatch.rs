//! Delivery strategy selection.
//!
//! One coherent policy for getting an alert to the operator: try the relay
//! API, then the authenticated session, then fall back to a pre-filled
//! manual-send link. The first success stops the chain; every failure is
//! non-fatal and simply advances to the next strategy.

use crate::config::RelayConfig;
use crate::phone::CanonicalPhone;
use crate::session::SessionError;
use serde::{Deserialize, Serialize};

/// The strategy that ultimately produced a delivery outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryStrategy {
    RelayApi,
    DirectSession,
    ManualLink,
    None,
}

/// The result of dispatching one notification request.
///
/// `delivered: false` with `strategy_used: ManualLink` means "the operator
/// was handed a link to complete delivery by hand" - distinguishable from
/// automatic delivery, but not a hard failure.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub strategy_used: DeliveryStrategy,
    pub delivered: bool,
    pub detail: String,
}

/// The dispatcher's view of the authenticated session.
///
/// Implemented by the session manager; test doubles implement it to assert
/// the readiness gate.
pub trait DirectSender {
    fn is_ready(&self) -> bool;
    fn send_raw(&self, destination: &CanonicalPhone, text: &str) -> Result<(), SessionError>;
}

/// Chooses and sequences delivery strategies.
pub struct DeliveryDispatcher {
    relay: Option<RelayConfig>,
    surface_base: String,
}

impl DeliveryDispatcher {
    pub fn new(relay: Option<RelayConfig>, surface_base: impl Into<String>) -> Self {
        Self {
            relay,
            surface_base: surface_base.into(),
        }
    }

    /// Deliver `text` to `destination`, trying strategies in priority order.
    ///
    /// Never panics and never returns an error; the worst case is an
    /// undelivered outcome describing what was attempted.
    pub fn deliver(
        &self,
        direct: &dyn DirectSender,
        destination: &CanonicalPhone,
        text: &str,
    ) -> DeliveryOutcome {
        if let Some(relay) = &self.relay {
            match send_via_relay(relay, destination, text) {
                Ok(()) => {
                    return DeliveryOutcome {
                        strategy_used: DeliveryStrategy::RelayApi,
                        delivered: true,
                        detail: "relay accepted the message".to_string(),
                    }
                }
                Err(e) => log::warn!("relay delivery failed, falling through: {}", e),
            }
        }

        // The readiness gate: the direct primitive is never invoked unless
        // the session reports ready.
        if direct.is_ready() {
            match direct.send_raw(destination, text) {
                Ok(()) => {
                    return DeliveryOutcome {
                        strategy_used: DeliveryStrategy::DirectSession,
                        delivered: true,
                        detail: "sent over the authenticated session".to_string(),
                    }
                }
                Err(e) => log::warn!("direct delivery failed, falling through: {}", e),
            }
        }

        match self.manual_link(destination, text) {
            Some(link) => DeliveryOutcome {
                strategy_used: DeliveryStrategy::ManualLink,
                delivered: false,
                detail: link,
            },
            None => DeliveryOutcome {
                strategy_used: DeliveryStrategy::None,
                delivered: false,
                detail: "no delivery strategy available".to_string(),
            },
        }
    }

    /// Build the pre-filled manual-send deep link.
    ///
    /// Returns `None` only when no surface base is configured.
    pub fn manual_link(&self, destination: &CanonicalPhone, text: &str) -> Option<String> {
        let base = self.surface_base.trim().trim_end_matches('/');
        if base.is_empty() {
            return None;
        }
        Some(format!(
            "{}/send?phone={}&text={}",
            base,
            destination,
            urlencoding::encode(text)
        ))
    }
}

/// One outbound call to the relay endpoint. Success is any 2xx status.
fn send_via_relay(
    relay: &RelayConfig,
    destination: &CanonicalPhone,
    text: &str,
) -> Result<(), String> {
    let agent = ureq::AgentBuilder::new().timeout(relay.timeout).build();
    agent
        .get(&relay.endpoint)
        .query("phone", destination.as_str())
        .query("text", text)
        .query("apikey", &relay.api_key)
        .call()
        .map_err(|e| format!("relay request failed: {}", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct FakeSender {
        ready: bool,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeSender {
        fn new(ready: bool, fail: bool) -> Self {
            Self {
                ready,
                fail,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl DirectSender for FakeSender {
        fn is_ready(&self) -> bool {
            self.ready
        }

        fn send_raw(&self, _destination: &CanonicalPhone, _text: &str) -> Result<(), SessionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(SessionError::SendFailed("socket closed".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn destination() -> CanonicalPhone {
        CanonicalPhone("573001112222".to_string())
    }

    fn no_relay() -> DeliveryDispatcher {
        DeliveryDispatcher::new(None, "https://api.whatsapp.com")
    }

    /// Relay credential pointing at a port nothing listens on; the call
    /// fails fast with a connection error.
    fn dead_relay() -> DeliveryDispatcher {
        let relay = RelayConfig::new("http://127.0.0.1:1/send", "key")
            .timeout(Duration::from_millis(500));
        DeliveryDispatcher::new(Some(relay), "https://api.whatsapp.com")
    }

    mod readiness_gate {
        use super::*;

        #[test]
        fn direct_primitive_never_invoked_when_not_ready() {
            let sender = FakeSender::new(false, false);
            let calls = Arc::clone(&sender.calls);

            let outcome = no_relay().deliver(&sender, &destination(), "hola");

            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(outcome.strategy_used, DeliveryStrategy::ManualLink);
            assert!(!outcome.delivered);
        }

        #[test]
        fn direct_used_when_ready() {
            let sender = FakeSender::new(true, false);
            let calls = Arc::clone(&sender.calls);

            let outcome = no_relay().deliver(&sender, &destination(), "hola");

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.strategy_used, DeliveryStrategy::DirectSession);
            assert!(outcome.delivered);
        }
    }

    mod fallback {
        use super::*;

        #[test]
        fn direct_failure_falls_through_to_manual_link() {
            let sender = FakeSender::new(true, true);

            let outcome = no_relay().deliver(&sender, &destination(), "hola");

            assert_eq!(outcome.strategy_used, DeliveryStrategy::ManualLink);
            assert!(!outcome.delivered);
            assert!(outcome.detail.starts_with("https://api.whatsapp.com/send?"));
        }

        #[test]
        fn relay_and_direct_unavailable_yield_manual_link() {
            let sender = FakeSender::new(false, false);
            let calls = Arc::clone(&sender.calls);

            let outcome = dead_relay().deliver(&sender, &destination(), "hola");

            assert_eq!(calls.load(Ordering::SeqCst), 0);
            assert_eq!(outcome.strategy_used, DeliveryStrategy::ManualLink);
            assert!(!outcome.delivered);
        }

        #[test]
        fn relay_failure_falls_through_to_ready_direct() {
            let sender = FakeSender::new(true, false);
            let calls = Arc::clone(&sender.calls);

            let outcome = dead_relay().deliver(&sender, &destination(), "hola");

            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert_eq!(outcome.strategy_used, DeliveryStrategy::DirectSession);
            assert!(outcome.delivered);
        }

        #[test]
        fn no_surface_base_yields_none_strategy() {
            let dispatcher = DeliveryDispatcher::new(None, "");
            let sender = FakeSender::new(false, false);

            let outcome = dispatcher.deliver(&sender, &destination(), "hola");

            assert_eq!(outcome.strategy_used, DeliveryStrategy::None);
            assert!(!outcome.delivered);
        }
    }

    mod manual_link {
        use super::*;

        #[test]
        fn encodes_destination_and_text() {
            let link = no_relay()
                .manual_link(&destination(), "Nuevo registro\nNombre: Ana Ruiz")
                .unwrap();

            assert_eq!(
                link,
                "https://api.whatsapp.com/send?phone=573001112222&text=Nuevo%20registro%0ANombre%3A%20Ana%20Ruiz"
            );
        }

        #[test]
        fn trailing_slash_on_base_is_tolerated() {
            let dispatcher = DeliveryDispatcher::new(None, "https://surface.example/");
            let link = dispatcher.manual_link(&destination(), "hola").unwrap();
            assert!(link.starts_with("https://surface.example/send?"));
        }

        #[test]
        fn blank_base_yields_no_link() {
            let dispatcher = DeliveryDispatcher::new(None, "   ");
            assert!(dispatcher.manual_link(&destination(), "hola").is_none());
        }
    }

    mod outcome {
        use super::*;

        #[test]
        fn serializes_camel_case() {
            let outcome = DeliveryOutcome {
                strategy_used: DeliveryStrategy::RelayApi,
                delivered: true,
                detail: "relay accepted the message".to_string(),
            };
            let json = serde_json::to_string(&outcome).unwrap();
            assert!(json.contains("\"strategyUsed\":\"relayApi\""));
            assert!(json.contains("\"delivered\":true"));
        }
    }
}
