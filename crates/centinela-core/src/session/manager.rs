//! SessionManager - supervises the one session with the messaging surface.
//!
//! Exactly one instance exists per process by construction of the
//! composition root (a second concurrent session for the same identity
//! would conflict at the protocol level). The manager is the single writer
//! of [`SessionState`]; everything else only reads. Lifecycle events arrive
//! on one channel from the surface client and are folded through the pure
//! transition function in [`super::state`].

use crate::bridge::{BridgeFactory, ClientFactory, SurfaceClient, SurfaceEvent};
use crate::config::{BridgeConfig, DEFAULT_ACK_TIMEOUT};
use crate::event_bus::{NotifierSignal, SignalBus};
use crate::phone::CanonicalPhone;
use crate::session::state::{next_state, SessionEvent, SessionState};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session not ready (state: {0})")]
    NotReady(SessionState),

    #[error("failed to open session client: {0}")]
    StartFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Send requests waiting for their bridge acknowledgment, keyed by request
/// id.
type PendingAcks = Arc<Mutex<HashMap<String, mpsc::Sender<Result<(), String>>>>>;

struct Inner {
    state: SessionState,
    /// Whether this process instance ever completed a pairing. Selects
    /// between `Disconnected` and `Failed` when the session is lost.
    ever_authenticated: bool,
    identity: Option<String>,
    client: Option<Box<dyn SurfaceClient>>,
    /// Guard against concurrent/re-entrant `start()`.
    starting: bool,
    /// Liveness flag of the current event loop; a re-arm or shutdown flips
    /// it so a stale loop cannot mutate the next session's state.
    loop_live: Option<Arc<AtomicBool>>,
}

/// Owns the session lifecycle and the send primitive.
pub struct SessionManager {
    inner: Arc<Mutex<Inner>>,
    pending: PendingAcks,
    factory: Box<dyn ClientFactory>,
    signals: Arc<SignalBus>,
    ack_timeout: Duration,
}

impl SessionManager {
    /// Create a manager that opens bridge subprocesses.
    pub fn new(bridge: BridgeConfig, signals: Arc<SignalBus>) -> Self {
        Self::with_factory(Box::new(BridgeFactory::new(bridge)), signals)
    }

    /// Create a manager with a custom client factory (test doubles,
    /// alternative transports).
    pub fn with_factory(factory: Box<dyn ClientFactory>, signals: Arc<SignalBus>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Uninitialized,
                ever_authenticated: false,
                identity: None,
                client: None,
                starting: false,
                loop_live: None,
            })),
            pending: Arc::new(Mutex::new(HashMap::new())),
            factory,
            signals,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    /// Arm the session.
    ///
    /// Idempotent: while a start is underway or the session is active, a
    /// second call returns immediately without opening another client.
    /// There is no automatic retry; after a `Disconnected`/`Failed` a
    /// supervisor re-arms explicitly by calling this again.
    pub fn start(&self) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock().unwrap();
            if inner.starting || inner.state.is_active() {
                log::debug!("start ignored, session already {}", inner.state);
                return Ok(());
            }
            inner.starting = true;
            let from = inner.state;
            inner.state = next_state(from, &SessionEvent::StartRequested, inner.ever_authenticated);
            if let Some(live) = inner.loop_live.take() {
                live.store(false, Ordering::SeqCst);
            }
            log::info!("session state {} -> {}", from, inner.state);
        }
        self.signals.emit(NotifierSignal::StateChanged {
            state: SessionState::Initializing,
        });

        let opened = self.factory.open().and_then(|mut client| {
            match client.take_events() {
                Some(events) => Ok((client, events)),
                None => Err("client exposed no event stream".to_string()),
            }
        });

        let mut inner = self.inner.lock().unwrap();
        inner.starting = false;

        match opened {
            Ok((client, events)) => {
                if inner.state != SessionState::Initializing {
                    // A concurrent shutdown won the race; discard the fresh
                    // client instead of resurrecting the session.
                    drop(inner);
                    client.close();
                    return Ok(());
                }
                let live = Arc::new(AtomicBool::new(true));
                inner.loop_live = Some(Arc::clone(&live));
                inner.client = Some(client);
                drop(inner);

                let inner_arc = Arc::clone(&self.inner);
                let pending = Arc::clone(&self.pending);
                let signals = Arc::clone(&self.signals);
                thread::spawn(move || run_event_loop(events, inner_arc, pending, signals, live));
                Ok(())
            }
            Err(e) => {
                let from = inner.state;
                inner.state = next_state(
                    from,
                    &SessionEvent::ClientCrashed { detail: e.clone() },
                    inner.ever_authenticated,
                );
                let state = inner.state;
                drop(inner);

                log::error!("session client failed to open: {}", e);
                self.signals.emit(NotifierSignal::StateChanged { state });
                Err(SessionError::StartFailed(e))
            }
        }
    }

    /// Pure readiness query. Never blocks on I/O.
    pub fn is_ready(&self) -> bool {
        self.inner.lock().unwrap().state.is_ready()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.inner.lock().unwrap().state
    }

    /// Identity reported by the surface on authentication, while the
    /// session holds one.
    pub fn identity(&self) -> Option<String> {
        self.inner.lock().unwrap().identity.clone()
    }

    /// Send text over the authenticated session.
    ///
    /// Precondition: [`Self::is_ready`]. A call made while not ready fails
    /// immediately with [`SessionError::NotReady`] - there is no queueing.
    /// A ready call waits (bounded) for the bridge's correlated
    /// acknowledgment.
    pub fn send_raw(&self, destination: &CanonicalPhone, text: &str) -> Result<(), SessionError> {
        let id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::channel();

        {
            let inner = self.inner.lock().unwrap();
            if !inner.state.is_ready() {
                return Err(SessionError::NotReady(inner.state));
            }
            let client = inner
                .client
                .as_ref()
                .ok_or(SessionError::NotReady(inner.state))?;

            self.pending.lock().unwrap().insert(id.clone(), tx);
            if let Err(e) = client.send(&id, destination.as_str(), text) {
                self.pending.lock().unwrap().remove(&id);
                return Err(SessionError::SendFailed(e));
            }
        }

        match rx.recv_timeout(self.ack_timeout) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SessionError::SendFailed(e)),
            Err(_) => {
                self.pending.lock().unwrap().remove(&id);
                Err(SessionError::SendFailed(format!(
                    "no acknowledgment within {:?}",
                    self.ack_timeout
                )))
            }
        }
    }

    /// Tear the session down.
    ///
    /// Safe from any state, including already torn down, and while sends
    /// are in flight (they fail instead of blocking). The client resource
    /// is released unconditionally.
    pub fn shutdown(&self) {
        let client = {
            let mut inner = self.inner.lock().unwrap();
            inner.starting = false;
            if let Some(live) = inner.loop_live.take() {
                live.store(false, Ordering::SeqCst);
            }
            let from = inner.state;
            inner.state = next_state(
                from,
                &SessionEvent::ShutdownRequested,
                inner.ever_authenticated,
            );
            inner.identity = None;
            if from != inner.state {
                log::info!("session state {} -> {}", from, inner.state);
            }
            inner.client.take()
        };

        abort_pending(&self.pending, "session shut down");

        if let Some(client) = client {
            client.close();
        }

        self.signals.emit(NotifierSignal::StateChanged {
            state: SessionState::Uninitialized,
        });
    }
}

impl crate::dispatch::DirectSender for SessionManager {
    fn is_ready(&self) -> bool {
        SessionManager::is_ready(self)
    }

    fn send_raw(&self, destination: &CanonicalPhone, text: &str) -> Result<(), SessionError> {
        SessionManager::send_raw(self, destination, text)
    }
}

/// Consume the client's event stream until it closes or the loop is
/// superseded.
fn run_event_loop(
    events: mpsc::Receiver<SurfaceEvent>,
    inner: Arc<Mutex<Inner>>,
    pending: PendingAcks,
    signals: Arc<SignalBus>,
    live: Arc<AtomicBool>,
) {
    while let Ok(event) = events.recv() {
        if !live.load(Ordering::SeqCst) {
            return;
        }

        match event {
            SurfaceEvent::SendResult { id, ok, error } => {
                let waiter = pending.lock().unwrap().remove(&id);
                match waiter {
                    Some(tx) => {
                        let result = if ok {
                            Ok(())
                        } else {
                            Err(error.unwrap_or_else(|| "send rejected".to_string()))
                        };
                        let _ = tx.send(result);
                    }
                    None => log::warn!("acknowledgment for unknown send request {}", id),
                }
            }
            SurfaceEvent::PairingCode { code } => {
                apply_event(
                    &inner,
                    &pending,
                    &signals,
                    &SessionEvent::PairingIssued { code: code.clone() },
                );
                // Emitted on every reissue: the newest code supersedes.
                signals.emit(NotifierSignal::PairingIssued { code });
            }
            SurfaceEvent::Authenticated { identity } => {
                apply_event(
                    &inner,
                    &pending,
                    &signals,
                    &SessionEvent::Authenticated { identity },
                );
            }
            SurfaceEvent::Ready => {
                apply_event(&inner, &pending, &signals, &SessionEvent::ConnectionReady);
            }
            SurfaceEvent::AuthFailure { reason } => {
                apply_event(&inner, &pending, &signals, &SessionEvent::AuthFailed { reason });
            }
            SurfaceEvent::Disconnected { reason } => {
                apply_event(
                    &inner,
                    &pending,
                    &signals,
                    &SessionEvent::ConnectionLost { reason },
                );
            }
            SurfaceEvent::Crashed { detail } => {
                apply_event(
                    &inner,
                    &pending,
                    &signals,
                    &SessionEvent::ClientCrashed { detail },
                );
            }
        }
    }

    // Stream closed without a terminal event: the client died silently.
    if live.load(Ordering::SeqCst) {
        apply_event(
            &inner,
            &pending,
            &signals,
            &SessionEvent::ClientCrashed {
                detail: "event stream closed".to_string(),
            },
        );
    }
}

/// Fold one event through the transition function and carry out its
/// side effects (identity bookkeeping, client teardown, signals, logs).
fn apply_event(
    inner: &Arc<Mutex<Inner>>,
    pending: &PendingAcks,
    signals: &Arc<SignalBus>,
    event: &SessionEvent,
) {
    let mut dead_client = None;
    let transition = {
        let mut guard = inner.lock().unwrap();
        let from = guard.state;
        let to = next_state(from, event, guard.ever_authenticated);

        if let SessionEvent::Authenticated { identity } = event {
            if to == SessionState::Authenticated {
                guard.ever_authenticated = true;
                guard.identity = identity.clone();
            }
        }

        if to != from {
            guard.state = to;
            if matches!(to, SessionState::Disconnected | SessionState::Failed) {
                guard.identity = None;
                dead_client = guard.client.take();
            }
            Some((from, to))
        } else {
            None
        }
    };

    match event {
        SessionEvent::AuthFailed { reason } => {
            log::error!("authentication rejected by the surface: {}", reason);
        }
        SessionEvent::ConnectionLost { reason } => log::warn!("session lost: {}", reason),
        SessionEvent::ClientCrashed { detail } => log::error!("session client died: {}", detail),
        _ => {}
    }

    if let Some((from, to)) = transition {
        log::info!("session state {} -> {}", from, to);
        if matches!(to, SessionState::Disconnected | SessionState::Failed) {
            abort_pending(pending, "session lost");
        }
        signals.emit(NotifierSignal::StateChanged { state: to });
    }

    if let Some(client) = dead_client {
        client.close();
    }
}

fn abort_pending(pending: &PendingAcks, reason: &str) {
    let waiters: Vec<_> = pending.lock().unwrap().drain().collect();
    for (_, tx) in waiters {
        let _ = tx.send(Err(reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[derive(Clone, Copy)]
    enum AckMode {
        Accept,
        Reject,
        Silent,
    }

    /// Scripted surface client. Lifecycle events are injected by the test
    /// through the factory's feed sender; sends are recorded and
    /// acknowledged according to the configured mode.
    struct FakeClient {
        events: Option<mpsc::Receiver<SurfaceEvent>>,
        feed: mpsc::Sender<SurfaceEvent>,
        sent: Arc<Mutex<Vec<(String, String)>>>,
        ack: AckMode,
        closed: Arc<AtomicBool>,
    }

    impl SurfaceClient for FakeClient {
        fn take_events(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>> {
            self.events.take()
        }

        fn send(&self, id: &str, destination: &str, text: &str) -> Result<(), String> {
            self.sent
                .lock()
                .unwrap()
                .push((destination.to_string(), text.to_string()));
            match self.ack {
                AckMode::Accept => {
                    let _ = self.feed.send(SurfaceEvent::SendResult {
                        id: id.to_string(),
                        ok: true,
                        error: None,
                    });
                }
                AckMode::Reject => {
                    let _ = self.feed.send(SurfaceEvent::SendResult {
                        id: id.to_string(),
                        ok: false,
                        error: Some("destination unreachable".to_string()),
                    });
                }
                AckMode::Silent => {}
            }
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    struct FakeFactory {
        opens: Arc<AtomicUsize>,
        feed: Arc<Mutex<Option<mpsc::Sender<SurfaceEvent>>>>,
        sent: Arc<Mutex<Vec<(String, String)>>>,
        closed: Arc<AtomicBool>,
        ack: AckMode,
        script: Vec<SurfaceEvent>,
    }

    impl FakeFactory {
        fn new(ack: AckMode, script: Vec<SurfaceEvent>) -> Self {
            Self {
                opens: Arc::new(AtomicUsize::new(0)),
                feed: Arc::new(Mutex::new(None)),
                sent: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(AtomicBool::new(false)),
                ack,
                script,
            }
        }
    }

    impl ClientFactory for FakeFactory {
        fn open(&self) -> Result<Box<dyn SurfaceClient>, String> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel();
            for event in &self.script {
                let _ = tx.send(event.clone());
            }
            *self.feed.lock().unwrap() = Some(tx.clone());
            Ok(Box::new(FakeClient {
                events: Some(rx),
                feed: tx,
                sent: Arc::clone(&self.sent),
                ack: self.ack,
                closed: Arc::clone(&self.closed),
            }))
        }
    }

    struct FailingFactory;

    impl ClientFactory for FailingFactory {
        fn open(&self) -> Result<Box<dyn SurfaceClient>, String> {
            Err("bridge binary not found".to_string())
        }
    }

    fn handshake() -> Vec<SurfaceEvent> {
        vec![
            SurfaceEvent::PairingCode {
                code: "2@abc".to_string(),
            },
            SurfaceEvent::Authenticated {
                identity: Some("573001112222".to_string()),
            },
            SurfaceEvent::Ready,
        ]
    }

    fn manager_with(
        factory: FakeFactory,
    ) -> (SessionManager, Arc<AtomicUsize>, Arc<Mutex<Vec<(String, String)>>>) {
        let opens = Arc::clone(&factory.opens);
        let sent = Arc::clone(&factory.sent);
        let manager = SessionManager::with_factory(Box::new(factory), Arc::new(SignalBus::new()))
            .ack_timeout(Duration::from_millis(200));
        (manager, opens, sent)
    }

    fn wait_for_state(manager: &SessionManager, expected: SessionState) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if manager.state() == expected {
                return;
            }
            thread::sleep(Duration::from_millis(5));
        }
        panic!(
            "session never reached {} (still {})",
            expected,
            manager.state()
        );
    }

    mod start {
        use super::*;

        #[test]
        fn opens_exactly_one_client() {
            let (manager, opens, _) = manager_with(FakeFactory::new(AckMode::Accept, vec![]));

            manager.start().unwrap();
            manager.start().unwrap();

            assert_eq!(opens.load(Ordering::SeqCst), 1);
            assert_eq!(manager.state(), SessionState::Initializing);
        }

        #[test]
        fn factory_failure_yields_failed_state() {
            let manager =
                SessionManager::with_factory(Box::new(FailingFactory), Arc::new(SignalBus::new()));

            let result = manager.start();
            assert!(matches!(result, Err(SessionError::StartFailed(_))));
            assert_eq!(manager.state(), SessionState::Failed);
            assert!(!manager.is_ready());
        }

        #[test]
        fn start_while_ready_is_a_no_op() {
            let (manager, opens, _) = manager_with(FakeFactory::new(AckMode::Accept, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);
            manager.start().unwrap();

            assert_eq!(opens.load(Ordering::SeqCst), 1);
            assert!(manager.is_ready());
        }
    }

    mod lifecycle {
        use super::*;

        #[test]
        fn scripted_handshake_reaches_ready() {
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Accept, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            assert!(manager.is_ready());
            assert_eq!(manager.identity().as_deref(), Some("573001112222"));
        }

        #[test]
        fn pairing_only_never_becomes_ready() {
            let script = vec![SurfaceEvent::PairingCode {
                code: "2@abc".to_string(),
            }];
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Accept, script));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::AwaitingPairing);

            assert!(!manager.is_ready());
            assert!(manager.identity().is_none());
        }

        #[test]
        fn disconnect_then_rearm() {
            let factory = FakeFactory::new(AckMode::Accept, handshake());
            let feed = Arc::clone(&factory.feed);
            let opens = Arc::clone(&factory.opens);
            let manager =
                SessionManager::with_factory(Box::new(factory), Arc::new(SignalBus::new()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            feed.lock()
                .unwrap()
                .as_ref()
                .unwrap()
                .send(SurfaceEvent::Disconnected {
                    reason: "surface logout".to_string(),
                })
                .unwrap();
            wait_for_state(&manager, SessionState::Disconnected);
            assert!(!manager.is_ready());
            assert!(manager.identity().is_none());

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);
            assert_eq!(opens.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn crash_before_authentication_fails() {
            let factory = FakeFactory::new(AckMode::Accept, vec![]);
            let feed = Arc::clone(&factory.feed);
            let manager =
                SessionManager::with_factory(Box::new(factory), Arc::new(SignalBus::new()));

            manager.start().unwrap();
            feed.lock()
                .unwrap()
                .as_ref()
                .unwrap()
                .send(SurfaceEvent::Crashed {
                    detail: "bridge exited with code 1".to_string(),
                })
                .unwrap();

            wait_for_state(&manager, SessionState::Failed);
        }

        #[test]
        fn pairing_codes_reach_the_signal_bus() {
            let signals = Arc::new(SignalBus::new());
            let mut rx = signals.subscribe();
            let factory = FakeFactory::new(
                AckMode::Accept,
                vec![
                    SurfaceEvent::PairingCode {
                        code: "2@first".to_string(),
                    },
                    SurfaceEvent::PairingCode {
                        code: "2@second".to_string(),
                    },
                ],
            );
            let manager = SessionManager::with_factory(Box::new(factory), Arc::clone(&signals));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::AwaitingPairing);

            let mut codes = Vec::new();
            let deadline = Instant::now() + Duration::from_secs(5);
            while codes.len() < 2 && Instant::now() < deadline {
                match rx.try_recv() {
                    Ok(NotifierSignal::PairingIssued { code }) => codes.push(code),
                    Ok(_) => {}
                    Err(_) => thread::sleep(Duration::from_millis(5)),
                }
            }
            assert_eq!(codes, vec!["2@first", "2@second"]);
        }
    }

    mod sending {
        use super::*;

        fn destination() -> CanonicalPhone {
            CanonicalPhone("573001112222".to_string())
        }

        #[test]
        fn send_raw_requires_ready() {
            let (manager, _, sent) = manager_with(FakeFactory::new(AckMode::Accept, vec![]));

            let result = manager.send_raw(&destination(), "hola");
            assert!(matches!(result, Err(SessionError::NotReady(_))));
            assert!(sent.lock().unwrap().is_empty());
        }

        #[test]
        fn send_raw_delivers_when_ready() {
            let (manager, _, sent) = manager_with(FakeFactory::new(AckMode::Accept, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            manager.send_raw(&destination(), "hola").unwrap();

            let sent = sent.lock().unwrap();
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].0, "573001112222");
            assert_eq!(sent[0].1, "hola");
        }

        #[test]
        fn rejected_acknowledgment_is_a_send_failure() {
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Reject, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            let result = manager.send_raw(&destination(), "hola");
            assert!(matches!(result, Err(SessionError::SendFailed(_))));
        }

        #[test]
        fn missing_acknowledgment_times_out() {
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Silent, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            let result = manager.send_raw(&destination(), "hola");
            assert!(matches!(result, Err(SessionError::SendFailed(_))));
        }

        #[test]
        fn send_after_disconnect_is_not_ready() {
            let factory = FakeFactory::new(AckMode::Accept, handshake());
            let feed = Arc::clone(&factory.feed);
            let manager =
                SessionManager::with_factory(Box::new(factory), Arc::new(SignalBus::new()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            feed.lock()
                .unwrap()
                .as_ref()
                .unwrap()
                .send(SurfaceEvent::Disconnected {
                    reason: "socket closed".to_string(),
                })
                .unwrap();
            wait_for_state(&manager, SessionState::Disconnected);

            let result = manager.send_raw(&CanonicalPhone("57300".to_string()), "hola");
            assert!(matches!(
                result,
                Err(SessionError::NotReady(SessionState::Disconnected))
            ));
        }
    }

    mod shutdown {
        use super::*;

        #[test]
        fn shutdown_releases_client_and_resets() {
            let factory = FakeFactory::new(AckMode::Accept, handshake());
            let closed = Arc::clone(&factory.closed);
            let (manager, _, _) = manager_with(factory);

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);

            manager.shutdown();
            assert_eq!(manager.state(), SessionState::Uninitialized);
            assert!(!manager.is_ready());
            assert!(closed.load(Ordering::SeqCst));
        }

        #[test]
        fn shutdown_is_safe_when_never_started() {
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Accept, vec![]));
            manager.shutdown();
            assert_eq!(manager.state(), SessionState::Uninitialized);
        }

        #[test]
        fn shutdown_twice_is_safe() {
            let (manager, _, _) = manager_with(FakeFactory::new(AckMode::Accept, handshake()));
            manager.start().unwrap();
            manager.shutdown();
            manager.shutdown();
            assert_eq!(manager.state(), SessionState::Uninitialized);
        }

        #[test]
        fn start_works_again_after_shutdown() {
            let (manager, opens, _) = manager_with(FakeFactory::new(AckMode::Accept, handshake()));

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);
            manager.shutdown();

            manager.start().unwrap();
            wait_for_state(&manager, SessionState::Ready);
            assert_eq!(opens.load(Ordering::SeqCst), 2);
        }
    }

    mod errors {
        use super::*;

        #[test]
        fn not_ready_names_the_state() {
            let error = SessionError::NotReady(SessionState::Disconnected);
            assert!(error.to_string().contains("disconnected"));
        }

        #[test]
        fn start_failed_carries_detail() {
            let error = SessionError::StartFailed("bridge binary not found".to_string());
            assert!(error.to_string().contains("bridge binary not found"));
        }
    }
}
