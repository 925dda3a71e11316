//! Bridge process spawning and I/O management.
//!
//! The core owns exactly one bridge process at a time. This module handles:
//! - Spawning it in a login shell
//! - Capturing stdout/stderr as line streams
//! - Writing commands to stdin
//! - Monitoring process exit
//!
//! Output is fanned into a single channel so the session layer can consume
//! everything the bridge says on one logical stream.

use crate::config::BridgeConfig;
use crate::shell::{build_login_shell_command, BridgeExit};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// Raw I/O events emitted by the bridge process.
#[derive(Debug, Clone)]
pub enum BridgeIo {
    /// A line was read from stdout
    Stdout(String),
    /// A line was read from stderr
    Stderr(String),
    /// The process exited
    Exit(BridgeExit),
}

/// A running bridge process.
///
/// Provides methods to communicate with the process and receive its I/O
/// events.
pub struct BridgeProcess {
    child: Arc<Mutex<Option<Child>>>,
    stdin: Arc<Mutex<Option<ChildStdin>>>,
    event_receiver: Receiver<BridgeIo>,
}

impl BridgeProcess {
    /// Spawn the bridge described by `config`.
    ///
    /// Immediately starts background threads for stdout/stderr reading and
    /// exit monitoring.
    pub fn spawn(config: &BridgeConfig) -> Result<Self, String> {
        let mut cmd = build_login_shell_command(
            &config.binary_path,
            &config.args,
            config.working_dir.as_deref(),
            config.shell_prefix.as_deref(),
        )?;

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| format!("Failed to spawn bridge: {}", e))?;

        let child_stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| "Failed to capture bridge stdout".to_string())?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| "Failed to capture bridge stderr".to_string())?;

        let (tx, rx) = mpsc::channel();

        let child_arc = Arc::new(Mutex::new(Some(child)));
        let stdin_arc = Arc::new(Mutex::new(child_stdin));

        // Stdout reader thread
        let tx_stdout = tx.clone();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines().flatten() {
                if tx_stdout.send(BridgeIo::Stdout(line)).is_err() {
                    break;
                }
            }
        });

        // Stderr reader thread
        let tx_stderr = tx.clone();
        thread::spawn(move || {
            let reader = BufReader::new(stderr);
            for line in reader.lines().flatten() {
                if tx_stderr.send(BridgeIo::Stderr(line)).is_err() {
                    break;
                }
            }
        });

        // Exit watcher thread
        let child_arc_exit = Arc::clone(&child_arc);
        let stdin_arc_exit = Arc::clone(&stdin_arc);
        let tx_exit = tx;
        thread::spawn(move || loop {
            let mut guard = child_arc_exit.lock().unwrap();
            if let Some(child) = guard.as_mut() {
                match child.try_wait() {
                    Ok(Some(status)) => {
                        let _ = tx_exit.send(BridgeIo::Exit(BridgeExit {
                            code: status.code().unwrap_or_default(),
                            signal: None,
                        }));
                        guard.take();
                        stdin_arc_exit.lock().unwrap().take();
                        break;
                    }
                    Ok(None) => {}
                    Err(_) => {
                        guard.take();
                        stdin_arc_exit.lock().unwrap().take();
                        break;
                    }
                }
            } else {
                break;
            }
            drop(guard);
            thread::sleep(Duration::from_millis(100));
        });

        Ok(Self {
            child: child_arc,
            stdin: stdin_arc,
            event_receiver: rx,
        })
    }

    /// Write a line to the bridge's stdin.
    pub fn write_stdin(&self, data: &str) -> Result<(), String> {
        let mut guard = self.stdin.lock().unwrap();
        if let Some(ref mut stdin) = *guard {
            writeln!(stdin, "{}", data).map_err(|e| format!("Failed to write to stdin: {}", e))?;
            stdin
                .flush()
                .map_err(|e| format!("Failed to flush stdin: {}", e))?;
            Ok(())
        } else {
            Err("No active stdin".to_string())
        }
    }

    /// Receive the next I/O event, blocking until one is available.
    ///
    /// Returns `None` if the channel is disconnected.
    pub fn recv(&self) -> Option<BridgeIo> {
        self.event_receiver.recv().ok()
    }

    /// Take ownership of the event receiver.
    ///
    /// This allows blocking receives without holding a lock on the process.
    /// After calling this, `recv()` always returns `None`.
    pub fn take_receiver(&mut self) -> Option<Receiver<BridgeIo>> {
        let (_, dummy_rx) = mpsc::channel();
        Some(std::mem::replace(&mut self.event_receiver, dummy_rx))
    }

    /// Check if the process is still running.
    pub fn is_running(&self) -> bool {
        self.child.lock().unwrap().is_some()
    }

    /// Stop the process gracefully (SIGINT on Unix, then force kill).
    ///
    /// The grace period lets the bridge close its surface connection cleanly
    /// instead of leaving a dangling half-open session.
    pub fn stop(&self) {
        // Close stdin first
        self.stdin.lock().unwrap().take();

        let mut guard = self.child.lock().unwrap();
        if let Some(ref mut child) = *guard {
            #[cfg(unix)]
            {
                let pid = child.id();
                unsafe {
                    libc::kill(pid as i32, libc::SIGINT);
                }
                for _ in 0..30 {
                    thread::sleep(Duration::from_millis(100));
                    match child.try_wait() {
                        Ok(Some(_)) => {
                            guard.take();
                            return;
                        }
                        Ok(None) => continue,
                        Err(_) => break,
                    }
                }
            }

            if let Some(mut child) = guard.take() {
                let _ = child.kill();
            }
        }
    }

    /// Force kill the process immediately.
    pub fn kill(&self) {
        self.stdin.lock().unwrap().take();
        if let Some(mut child) = self.child.lock().unwrap().take() {
            let _ = child.kill();
        }
    }
}
