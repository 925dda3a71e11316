//! Configuration types for the notification core.
//!
//! All configuration is plain data handed in by the composition root (the
//! daemon binary, a host backend, tests). The core never reads the
//! environment itself.

use std::time::Duration;

/// Default base URL for manual-send deep links.
pub const DEFAULT_SURFACE_BASE: &str = "https://api.whatsapp.com";

/// Default wait for the bridge's send acknowledgment.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for a relay API call.
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Dialing rules used to canonicalize destination phone numbers.
#[derive(Debug, Clone)]
pub struct DialingPlan {
    /// International calling code, digits only (e.g. "57").
    pub calling_code: String,
    /// Leading digit of mobile subscriber numbers (e.g. "3").
    pub mobile_prefix: String,
    /// Digit count of a local subscriber number (e.g. 10).
    pub local_number_len: usize,
}

impl Default for DialingPlan {
    fn default() -> Self {
        Self {
            calling_code: "57".to_string(),
            mobile_prefix: "3".to_string(),
            local_number_len: 10,
        }
    }
}

/// Credentials for the third-party relay endpoint.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Full endpoint URL; `phone`, `text` and `apikey` are appended as query
    /// parameters.
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl RelayConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Configuration for spawning the surface bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Path to the bridge binary.
    pub binary_path: String,
    /// Arguments to pass to the binary.
    pub args: Vec<String>,
    /// Working directory for the process.
    pub working_dir: Option<String>,
    /// Custom shell prefix (e.g. "/bin/zsh -l -c").
    pub shell_prefix: Option<String>,
    /// Directory for session transcript logs; no transcript when absent.
    pub log_dir: Option<String>,
}

impl BridgeConfig {
    /// Create a new bridge config with required fields.
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            working_dir: None,
            shell_prefix: None,
            log_dir: None,
        }
    }

    pub fn args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn shell_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.shell_prefix = Some(prefix.into());
        self
    }

    pub fn log_dir(mut self, dir: impl Into<String>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }
}

/// Top-level configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// The fixed operator address alerts are delivered to when a request
    /// carries no destination of its own.
    pub operator_phone: String,
    pub dialing: DialingPlan,
    /// Base URL for manual-send deep links.
    pub surface_base: String,
    /// Relay credentials; the relay strategy is skipped when absent.
    pub relay: Option<RelayConfig>,
    pub bridge: BridgeConfig,
    /// How long a direct send waits for the bridge's acknowledgment.
    pub ack_timeout: Duration,
}

impl NotifierConfig {
    pub fn new(operator_phone: impl Into<String>, bridge: BridgeConfig) -> Self {
        Self {
            operator_phone: operator_phone.into(),
            dialing: DialingPlan::default(),
            surface_base: DEFAULT_SURFACE_BASE.to_string(),
            relay: None,
            bridge,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        }
    }

    pub fn dialing(mut self, dialing: DialingPlan) -> Self {
        self.dialing = dialing;
        self
    }

    pub fn surface_base(mut self, base: impl Into<String>) -> Self {
        self.surface_base = base.into();
        self
    }

    pub fn relay(mut self, relay: RelayConfig) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }
}
