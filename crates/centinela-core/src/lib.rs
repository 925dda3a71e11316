//! # centinela-core
//!
//! Outbound operator-alert notification core. A long-lived client pairs
//! with an external messaging surface through a scannable challenge,
//! supervises that session across the process lifetime, and delivers short
//! operational alerts through a priority chain of strategies - relay API,
//! authenticated direct send, pre-filled manual link - without ever
//! blocking or crashing the caller.
//!
//! This crate is framework-agnostic and can be used by:
//! - The centinela daemon (terminal operator surface)
//! - A host backend submitting "a user registered" facts
//! - Tests, via injected client factories
//!
//! ## Key Concepts
//!
//! - **Session**: exactly one authenticated connection to the surface per
//!   process, owned by [`SessionManager`]
//! - **Delivery chain**: relay first, direct session second, manual link
//!   as the always-available fallback
//! - **Signals**: pairing challenges, state changes and outcomes broadcast
//!   to pluggable sinks via [`SignalBus`]

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod event_bus;
pub mod logging;
pub mod message;
pub mod notifier;
pub mod phone;
pub mod session;
pub mod shell;
pub mod spawn;

// Re-export commonly used types
pub use config::{BridgeConfig, DialingPlan, NotifierConfig, RelayConfig};
pub use dispatch::{DeliveryDispatcher, DeliveryOutcome, DeliveryStrategy};
pub use event_bus::{NotifierSignal, SignalBus};
pub use message::{NotificationPayload, NotificationRequest};
pub use notifier::{NotificationService, NotifierStatus};
pub use phone::CanonicalPhone;
pub use session::{SessionError, SessionManager, SessionState};
