use serde_json::Value;
use tracing::{debug, warn};

use pepito_core::event::HEARTBEAT_TAG;

/// Optional line prefix in the event-stream framing.
pub const DATA_PREFIX: &str = "data:";

/// Accumulates raw response bytes and yields complete text lines, carrying
/// partial lines across chunk boundaries.
#[derive(Default)]
pub struct LineDecoder {
    buf: String,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let Ok(text) = std::str::from_utf8(chunk) else {
            debug!(len = chunk.len(), "non-UTF-8 chunk skipped");
            return Vec::new();
        };
        self.buf.push_str(text);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.find('\n') {
            lines.push(self.buf[..pos].to_string());
            self.buf.drain(..=pos);
        }
        lines
    }
}

/// Decode one framed line into a JSON payload.
///
/// Lines are trimmed, blank lines ignored and a `data:` prefix stripped;
/// the remainder must be JSON. A decode failure is logged and the line
/// skipped; it never breaks the connection.
pub fn decode_line(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let body = line.strip_prefix(DATA_PREFIX).map(str::trim).unwrap_or(line);

    match serde_json::from_str(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(error = %e, line = body, "undecodable stream line skipped");
            None
        }
    }
}

/// Keep-alive payloads never reach the dispatcher.
pub fn is_heartbeat(payload: &Value) -> bool {
    payload.get("event").and_then(Value::as_str) == Some(HEARTBEAT_TAG)
}
