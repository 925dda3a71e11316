//! Public notification facade.
//!
//! The one entry point callers see. A request comes in, the destination is
//! canonicalized, the message rendered, the dispatcher runs its strategy
//! chain, and a [`DeliveryOutcome`] comes back. Nothing here ever
//! propagates a failure upward; the outcome is for logging, not for
//! blocking a caller's own response on.

use crate::config::NotifierConfig;
use crate::dispatch::{DeliveryDispatcher, DeliveryOutcome};
use crate::event_bus::{NotifierSignal, SignalBus};
use crate::message::{self, NotificationRequest};
use crate::phone;
use crate::session::{SessionManager, SessionState};
use serde::Serialize;
use std::sync::Arc;

/// Diagnostic snapshot for the operator surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifierStatus {
    pub ready: bool,
    pub state: SessionState,
    /// Authenticated identity; only reported while ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
}

/// Facade over the session, formatter, normalizer and dispatcher.
///
/// Explicitly constructed by the process composition root, which owns the
/// [`SessionManager`] instance and its lifecycle.
pub struct NotificationService {
    config: NotifierConfig,
    session: Arc<SessionManager>,
    dispatcher: DeliveryDispatcher,
    signals: Arc<SignalBus>,
}

impl NotificationService {
    pub fn new(
        config: NotifierConfig,
        session: Arc<SessionManager>,
        signals: Arc<SignalBus>,
    ) -> Self {
        let dispatcher =
            DeliveryDispatcher::new(config.relay.clone(), config.surface_base.clone());
        Self {
            config,
            session,
            dispatcher,
            signals,
        }
    }

    /// Arm the underlying session. Safe to call repeatedly; failures are
    /// logged, never raised.
    pub fn start(&self) {
        if let Err(e) = self.session.start() {
            log::error!("session start failed: {}", e);
        }
    }

    /// Deliver one notification, best effort.
    ///
    /// Always returns an outcome; an empty destination falls back to the
    /// configured operator address.
    pub fn notify(&self, request: NotificationRequest) -> DeliveryOutcome {
        let raw_destination = if request.destination.trim().is_empty() {
            self.config.operator_phone.as_str()
        } else {
            request.destination.as_str()
        };
        let destination = phone::normalize(raw_destination, &self.config.dialing);
        let text = message::format(&request.payload);

        log::info!(
            "dispatching {} alert to {}",
            request.payload.kind(),
            destination
        );
        let outcome = self
            .dispatcher
            .deliver(self.session.as_ref(), &destination, &text);

        if outcome.delivered {
            log::info!("alert delivered via {:?}", outcome.strategy_used);
        } else {
            log::warn!(
                "alert not auto-delivered (strategy {:?}): {}",
                outcome.strategy_used,
                outcome.detail
            );
        }
        self.signals.emit(NotifierSignal::DeliveryCompleted {
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Diagnostic read used by the operator surface.
    pub fn status(&self) -> NotifierStatus {
        let state = self.session.state();
        let ready = state.is_ready();
        NotifierStatus {
            ready,
            state,
            identity: if ready { self.session.identity() } else { None },
        }
    }

    /// Operational health check: a fixed ping to the operator address.
    pub fn send_test_ping(&self) -> DeliveryOutcome {
        self.notify(NotificationRequest::ping())
    }

    /// Tear the session down.
    pub fn shutdown(&self) {
        self.session.shutdown();
    }
}
