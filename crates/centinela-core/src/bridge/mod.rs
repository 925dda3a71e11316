//! Surface bridge client.
//!
//! The real connection to the messaging surface lives in a bridge
//! subprocess. This module owns the seam between the session layer and that
//! process: the [`SurfaceClient`] trait is everything the session layer
//! knows about, and [`BridgeClient`] is the production implementation that
//! spawns the bridge, translates its stdout stream into [`SurfaceEvent`]s
//! and writes send commands to its stdin.

pub mod parser;
pub mod types;

use crate::config::BridgeConfig;
use crate::logging::{open_transcript, transcript_line, LogHandle};
use crate::spawn::{BridgeIo, BridgeProcess};
use parser::BridgeParser;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use types::SendCommand;

/// Events surfaced by the underlying session client.
///
/// These are the only things the session layer ever learns about the
/// messaging surface; everything arrives on one logical stream.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// A pairing challenge was issued (or reissued, superseding the last).
    PairingCode { code: String },
    /// The handshake completed.
    Authenticated { identity: Option<String> },
    /// The session is fully operational.
    Ready,
    /// The surface rejected the handshake.
    AuthFailure { reason: String },
    /// An established session was lost.
    Disconnected { reason: String },
    /// Acknowledgment for a previously issued send command.
    SendResult {
        id: String,
        ok: bool,
        error: Option<String>,
    },
    /// The client itself died unexpectedly.
    Crashed { detail: String },
}

/// The session layer's view of a surface client.
pub trait SurfaceClient: Send {
    /// Take the event stream. Yields `None` after the first call.
    fn take_events(&mut self) -> Option<Receiver<SurfaceEvent>>;

    /// Queue a send command. `Ok` means the command reached the client, not
    /// that the destination received anything; the correlated
    /// [`SurfaceEvent::SendResult`] carries the actual outcome.
    fn send(&self, id: &str, destination: &str, text: &str) -> Result<(), String>;

    /// Tear the client down unconditionally.
    fn close(&self);
}

/// Opens surface clients. Injected into the session manager so tests can
/// substitute doubles and count constructions.
pub trait ClientFactory: Send + Sync {
    fn open(&self) -> Result<Box<dyn SurfaceClient>, String>;
}

/// Production factory: each `open` spawns a fresh bridge process.
pub struct BridgeFactory {
    config: BridgeConfig,
}

impl BridgeFactory {
    pub fn new(config: BridgeConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for BridgeFactory {
    fn open(&self) -> Result<Box<dyn SurfaceClient>, String> {
        Ok(Box::new(BridgeClient::open(&self.config)?))
    }
}

/// A live bridge subprocess speaking the line-JSON protocol.
pub struct BridgeClient {
    process: BridgeProcess,
    events: Option<Receiver<SurfaceEvent>>,
    transcript: LogHandle,
}

impl BridgeClient {
    /// Spawn the bridge and start translating its output.
    pub fn open(config: &BridgeConfig) -> Result<Self, String> {
        let transcript = open_transcript(config.log_dir.as_deref(), "bridge");

        let mut process = BridgeProcess::spawn(config)?;
        let io_events = process
            .take_receiver()
            .ok_or_else(|| "Failed to take bridge event receiver".to_string())?;

        let (tx, rx) = mpsc::channel();

        // Translation thread: raw process I/O in, surface events out.
        let thread_transcript = transcript.clone();
        thread::spawn(move || {
            let mut parser = BridgeParser::new();

            while let Ok(io) = io_events.recv() {
                match io {
                    BridgeIo::Stdout(line) => {
                        transcript_line(&thread_transcript, "RX", &line);
                        for event in parser.feed(&format!("{line}\n")) {
                            if tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    BridgeIo::Stderr(line) => {
                        log::warn!("bridge stderr: {}", line);
                        transcript_line(&thread_transcript, "ERR", &line);
                    }
                    BridgeIo::Exit(exit) => {
                        for event in parser.flush() {
                            let _ = tx.send(event);
                        }
                        let _ = tx.send(SurfaceEvent::Crashed {
                            detail: format!("bridge exited with code {}", exit.code),
                        });
                        break;
                    }
                }
            }
        });

        Ok(Self {
            process,
            events: Some(rx),
            transcript,
        })
    }
}

impl SurfaceClient for BridgeClient {
    fn take_events(&mut self) -> Option<Receiver<SurfaceEvent>> {
        self.events.take()
    }

    fn send(&self, id: &str, destination: &str, text: &str) -> Result<(), String> {
        let command = SendCommand::new(id, destination, text);
        let line = serde_json::to_string(&command)
            .map_err(|e| format!("Failed to encode send command: {}", e))?;
        transcript_line(&self.transcript, "TX", &line);
        self.process.write_stdin(&line)
    }

    fn close(&self) {
        self.process.stop();
    }
}
