//! Session transcript logging.
//!
//! Appends timestamped, direction-tagged lines of bridge traffic to a
//! per-session file. With no log directory configured the handle is inert
//! and every write is a no-op.

use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::Utc;

/// Thread-safe handle to an append-only transcript file.
pub type LogHandle = Arc<Mutex<Option<File>>>;

/// Open (or create) a transcript at `{log_dir}/{log_id}.log`.
///
/// Returns an inert handle when `log_dir` is absent or cannot be created.
pub fn open_transcript(log_dir: Option<&str>, log_id: &str) -> LogHandle {
    let file = log_dir.and_then(|dir| {
        let path = Path::new(dir).join(format!("{}.log", log_id));
        std::fs::create_dir_all(dir).ok()?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });
    Arc::new(Mutex::new(file))
}

/// Write a timestamped line to the transcript (if present).
///
/// `direction` is a short tag such as "RX", "TX" or "ERR".
pub fn transcript_line(handle: &LogHandle, direction: &str, data: &str) {
    if let Ok(mut guard) = handle.lock() {
        if let Some(ref mut file) = *guard {
            let ts = Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
            let _ = writeln!(file, "[{}] {}: {}", ts, direction, data);
            let _ = file.flush();
        }
    }
}
