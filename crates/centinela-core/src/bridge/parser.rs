//! Bridge stream parser.
//!
//! Buffers chunked stdout data from the bridge, splits it into complete
//! lines and translates each JSON line into a [`SurfaceEvent`]. Lines that
//! are not valid JSON (interpreter banners, stray prints) and events the
//! core does not know are skipped, not fatal.

use super::types::BridgeStreamEvent;
use super::SurfaceEvent;

/// Parser state for one bridge session.
#[derive(Debug, Default)]
pub struct BridgeParser {
    /// Buffer for incomplete lines; chunks may end mid-JSON.
    buffer: String,
}

impl BridgeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed data to the parser and collect translated events.
    ///
    /// The data may contain partial lines; these are buffered until the
    /// closing newline arrives.
    pub fn feed(&mut self, data: &str) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();

        self.buffer.push_str(data);

        let buffer = std::mem::take(&mut self.buffer);
        let mut lines: Vec<&str> = buffer.split('\n').collect();

        // The last element is either "" (data ended on a newline) or an
        // incomplete line that goes back into the buffer.
        if let Some(last) = lines.pop() {
            self.buffer = last.to_string();
        }

        for line in lines {
            if let Some(event) = translate_line(line) {
                events.push(event);
            }
        }

        events
    }

    /// Flush any buffered partial line, translating it if possible.
    pub fn flush(&mut self) -> Vec<SurfaceEvent> {
        let rest = std::mem::take(&mut self.buffer);
        translate_line(&rest).into_iter().collect()
    }
}

fn translate_line(line: &str) -> Option<SurfaceEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let event: BridgeStreamEvent = match serde_json::from_str(trimmed) {
        Ok(event) => event,
        Err(_) => {
            log::debug!("skipping non-JSON bridge line: {}", trimmed);
            return None;
        }
    };

    match event.event.as_str() {
        "pairing" => Some(SurfaceEvent::PairingCode {
            code: event.code.unwrap_or_default(),
        }),
        "authenticated" => Some(SurfaceEvent::Authenticated {
            identity: event.identity,
        }),
        "ready" => Some(SurfaceEvent::Ready),
        "auth_failure" => Some(SurfaceEvent::AuthFailure {
            reason: event.reason.unwrap_or_else(|| "unknown".to_string()),
        }),
        "disconnected" => Some(SurfaceEvent::Disconnected {
            reason: event.reason.unwrap_or_else(|| "unknown".to_string()),
        }),
        "send_result" => Some(SurfaceEvent::SendResult {
            id: event.id.unwrap_or_default(),
            ok: event.ok.unwrap_or(false),
            error: event.error,
        }),
        other => {
            log::debug!("skipping unknown bridge event: {}", other);
            None
        }
    }
}
