// ── Server-sent event framing ──
//
// Incremental decoder for the `text/event-stream` wire format. Bytes
// arrive in arbitrary chunks; complete events come out in source order.

use std::time::Duration;

use bytes::{Buf, BytesMut};

const DEFAULT_EVENT: &str = "message";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Event type from the `event:` field, `"message"` when absent.
    pub event: String,
    /// Concatenated `data:` lines, joined with `\n`.
    pub data: String,
    /// Last event id in effect when this event was dispatched.
    pub id: Option<String>,
}

/// Line-oriented SSE decoder.
///
/// Keeps the last event id and the server-requested reconnection delay
/// across [`reset`](Self::reset) so a reconnecting stream can resume.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buf: BytesMut,
    event: String,
    data: String,
    has_data: bool,
    seen_first_line: bool,
    last_event_id: Option<String>,
    retry: Option<Duration>,
}

impl SseDecoder {
    /// Feed a chunk of bytes, returning every event completed by it.
    pub(crate) fn feed(&mut self, chunk: &[u8]) -> Vec<MessageEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Drop any partially received event. Called between connections.
    pub(crate) fn reset(&mut self) {
        self.buf.clear();
        self.event.clear();
        self.data.clear();
        self.has_data = false;
        self.seen_first_line = false;
    }

    pub(crate) fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Reconnection delay requested by the server via `retry:`.
    pub(crate) fn retry(&self) -> Option<Duration> {
        self.retry
    }

    /// Split off the next complete line. A trailing `\r` is held back
    /// until the following byte shows whether it starts a `\r\n`.
    fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|b| *b == b'\n' || *b == b'\r')?;

        let terminator_len = if self.buf[pos] == b'\r' {
            match self.buf.get(pos + 1) {
                Some(b'\n') => 2,
                Some(_) => 1,
                None => return None,
            }
        } else {
            1
        };

        let raw = self.buf.split_to(pos);
        self.buf.advance(terminator_len);

        let mut line = String::from_utf8_lossy(&raw).into_owned();
        if !self.seen_first_line {
            self.seen_first_line = true;
            if let Some(stripped) = line.strip_prefix('\u{feff}') {
                line = stripped.to_owned();
            }
        }
        Some(line)
    }

    fn process_line(&mut self, line: &str) -> Option<MessageEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => value.clone_into(&mut self.event),
            "data" => {
                if self.has_data {
                    self.data.push('\n');
                }
                self.data.push_str(value);
                self.has_data = true;
            }
            "id" if !value.contains('\0') => {
                self.last_event_id = Some(value.to_owned());
            }
            "retry" => {
                if let Ok(ms) = value.parse::<u64>() {
                    self.retry = Some(Duration::from_millis(ms));
                }
            }
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<MessageEvent> {
        let event = std::mem::take(&mut self.event);
        if !self.has_data {
            return None;
        }
        self.has_data = false;

        Some(MessageEvent {
            event: if event.is_empty() {
                DEFAULT_EVENT.to_owned()
            } else {
                event
            },
            data: std::mem::take(&mut self.data),
            id: self.last_event_id.clone(),
        })
    }
}
