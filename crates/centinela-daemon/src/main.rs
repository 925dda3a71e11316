//! Centinela daemon - runs the notification core and renders operator
//! signals to the terminal.
//!
//! This binary is the process composition root: it owns the one
//! `SessionManager`, wires the signal bus to stdout, and tears the session
//! down on Ctrl-C. Pairing challenges are printed prominently so the
//! operator can complete the handshake from a phone.

use centinela_core::{
    BridgeConfig, DialingPlan, NotificationService, NotifierConfig, NotifierSignal, RelayConfig,
    SessionManager, SignalBus,
};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(name = "centinela-daemon", about = "Operator-alert notifier daemon")]
struct Cli {
    /// Operator phone number that receives alerts.
    #[arg(long, env = "CENTINELA_OPERATOR_PHONE")]
    operator_phone: String,

    /// Path to the surface bridge binary.
    #[arg(long, env = "CENTINELA_BRIDGE_PATH")]
    bridge_path: String,

    /// Working directory for the bridge process.
    #[arg(long, env = "CENTINELA_BRIDGE_DIR")]
    bridge_dir: Option<String>,

    /// Directory for session transcript logs.
    #[arg(long, env = "CENTINELA_LOG_DIR")]
    log_dir: Option<String>,

    /// Relay endpoint URL; enables the relay strategy when set together
    /// with the API key.
    #[arg(long, env = "CENTINELA_RELAY_ENDPOINT")]
    relay_endpoint: Option<String>,

    /// Relay API key.
    #[arg(long, env = "CENTINELA_RELAY_APIKEY")]
    relay_apikey: Option<String>,

    /// Base URL for manual-send links.
    #[arg(
        long,
        env = "CENTINELA_SURFACE_BASE",
        default_value = "https://api.whatsapp.com"
    )]
    surface_base: String,

    /// International calling code for destination normalization.
    #[arg(long, default_value = "57")]
    calling_code: String,

    /// Fire a test ping once the session becomes ready.
    #[arg(long)]
    test_ping: bool,
}

fn build_config(cli: &Cli) -> NotifierConfig {
    let mut bridge = BridgeConfig::new(&cli.bridge_path);
    if let Some(dir) = &cli.bridge_dir {
        bridge = bridge.working_dir(dir);
    }
    if let Some(dir) = &cli.log_dir {
        bridge = bridge.log_dir(dir);
    }

    let mut config = NotifierConfig::new(&cli.operator_phone, bridge)
        .surface_base(&cli.surface_base)
        .dialing(DialingPlan {
            calling_code: cli.calling_code.clone(),
            ..DialingPlan::default()
        });

    if let (Some(endpoint), Some(apikey)) = (&cli.relay_endpoint, &cli.relay_apikey) {
        config = config.relay(RelayConfig::new(endpoint, apikey));
    }

    config
}

fn render_pairing_code(code: &str) {
    println!();
    println!("==================================================");
    println!(" Pairing required - scan this code from your phone");
    println!("==================================================");
    println!("{}", code);
    println!("==================================================");
    println!();
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    let config = build_config(&cli);

    let signals = Arc::new(SignalBus::new());
    let session = Arc::new(SessionManager::new(
        config.bridge.clone(),
        Arc::clone(&signals),
    ));
    let service = Arc::new(NotificationService::new(
        config,
        session,
        Arc::clone(&signals),
    ));

    let mut rx = signals.subscribe();
    service.start();
    log::info!("centinela daemon started");

    let mut ping_pending = cli.test_ping;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutting down");
                service.shutdown();
                break;
            }
            signal = rx.recv() => match signal {
                Ok(NotifierSignal::PairingIssued { code }) => render_pairing_code(&code),
                Ok(NotifierSignal::StateChanged { state }) => {
                    log::info!("session state: {}", state);
                    if state.is_ready() && ping_pending {
                        ping_pending = false;
                        let service = Arc::clone(&service);
                        tokio::task::spawn_blocking(move || {
                            let outcome = service.send_test_ping();
                            log::info!(
                                "test ping outcome: strategy {:?}, delivered {}",
                                outcome.strategy_used,
                                outcome.delivered
                            );
                        });
                    }
                }
                Ok(NotifierSignal::DeliveryCompleted { outcome }) => {
                    log::debug!("delivery completed via {:?}", outcome.strategy_used);
                }
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("signal stream lagged, missed {} signals", missed);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }
}
