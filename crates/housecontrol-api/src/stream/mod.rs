//! Server-sent event stream with auto-reconnect.
//!
//! Connects to the house server's `/stream` endpoint and delivers parsed
//! events to listeners registered per event type, in the order the server
//! emits them. Handles reconnection with exponential backoff + jitter.
//!
//! # Example
//!
//! ```rust,ignore
//! use housecontrol_api::stream::{ReconnectConfig, StreamEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let mut handle = client.open_stream(ReconnectConfig::default(), CancellationToken::new())?;
//! let mut status = handle.add_listener("status", |event: &StreamEvent| {
//!     println!("{event:?}");
//! });
//! handle.start();
//!
//! // later
//! status.remove();
//! handle.shutdown();
//! ```

mod sse;

use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

pub use sse::MessageEvent;
use sse::SseDecoder;

const EVENT_STREAM_MIME: &str = "text/event-stream";
const LAST_EVENT_ID: &str = "Last-Event-ID";

// ── StreamEvent ──────────────────────────────────────────────────────

/// Everything a stream listener can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The connection was (re-)established and the server is streaming.
    Open,
    /// A server-sent event.
    Message(MessageEvent),
    /// The connection failed or dropped with an error.
    Error { message: String },
}

impl StreamEvent {
    /// Listener key this event is delivered under.
    ///
    /// Transport failures and server-sent `error` events share the
    /// `"error"` key.
    pub fn name(&self) -> &str {
        match self {
            Self::Open => "open",
            Self::Message(msg) => &msg.event,
            Self::Error { .. } => "error",
        }
    }
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for stream reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    /// A server `retry:` field overrides it.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum consecutive failed attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── Listener table ───────────────────────────────────────────────────

type Listener = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    entries: Vec<(u64, String, Listener)>,
}

impl ListenerTable {
    fn matching(&self, name: &str) -> Vec<Listener> {
        self.entries
            .iter()
            .filter(|(_, event, _)| event == name)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect()
    }
}

type SharedListeners = Arc<Mutex<ListenerTable>>;

/// A listener registered on a [`StreamHandle`].
///
/// Removing is idempotent, and a registration that outlives its handle
/// removes nothing.
#[derive(Debug)]
pub struct Registration {
    id: u64,
    event: String,
    table: Weak<Mutex<ListenerTable>>,
    removed: bool,
}

impl Registration {
    /// Event type this registration listens for.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether [`remove`](Self::remove) has already run.
    pub fn is_removed(&self) -> bool {
        self.removed
    }

    /// Unregister the listener.
    pub fn remove(&mut self) {
        if std::mem::replace(&mut self.removed, true) {
            return;
        }
        if let Some(table) = self.table.upgrade() {
            let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
            table.entries.retain(|(id, _, _)| *id != self.id);
        }
    }
}

// ── StreamHandle ─────────────────────────────────────────────────────

struct PendingConnection {
    http: reqwest::Client,
    url: Url,
    reconnect: ReconnectConfig,
}

/// Handle to a server push stream.
///
/// Created unstarted so listeners can be registered before the first
/// event can possibly arrive; [`start`](Self::start) spawns the
/// connection task. [`shutdown`](Self::shutdown) (or dropping the handle)
/// stops it.
pub struct StreamHandle {
    listeners: SharedListeners,
    cancel: CancellationToken,
    pending: Option<PendingConnection>,
}

impl StreamHandle {
    /// Create a handle for `url`. Nothing is sent until [`start`](Self::start).
    pub fn connect(
        http: reqwest::Client,
        url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            listeners: SharedListeners::default(),
            cancel,
            pending: Some(PendingConnection {
                http,
                url,
                reconnect,
            }),
        }
    }

    /// Register `listener` for events named `event`.
    pub fn add_listener<F>(&self, event: &str, listener: F) -> Registration
    where
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        let mut table = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = table.next_id;
        table.next_id += 1;
        table
            .entries
            .push((id, event.to_owned(), Arc::new(listener)));

        Registration {
            id,
            event: event.to_owned(),
            table: Arc::downgrade(&self.listeners),
            removed: false,
        }
    }

    /// Number of live listener registrations.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    /// Spawn the connection task. Subsequent calls do nothing.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        let Some(PendingConnection {
            http,
            url,
            reconnect,
        }) = self.pending.take()
        else {
            return;
        };
        if self.cancel.is_cancelled() {
            return;
        }

        let listeners = Arc::clone(&self.listeners);
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            sse_loop(http, url, reconnect, cancel, listeners).await;
        });
    }

    /// Signal the connection task to stop. Safe to call repeatedly.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Whether [`shutdown`](Self::shutdown) has been signalled.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on drop, wait → reconnect.
async fn sse_loop(
    http: reqwest::Client,
    url: Url,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    listeners: SharedListeners,
) {
    let mut decoder = SseDecoder::default();
    let mut attempt: u32 = 0;

    loop {
        decoder.reset();

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = connect_and_read(&http, &url, &mut decoder, &listeners, &cancel) => result,
        };

        let delay = match outcome {
            // Server ended the response. Reconnect after the base delay.
            Ok(()) => {
                tracing::info!("event stream ended, reconnecting");
                attempt = 0;
                base_delay(&decoder, &reconnect)
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "event stream error");
                notify(
                    &listeners,
                    &cancel,
                    &StreamEvent::Error {
                        message: e.to_string(),
                    },
                );

                if let Some(max) = reconnect.max_retries {
                    if attempt >= max {
                        tracing::error!(
                            max_retries = max,
                            "event stream reconnection limit reached, giving up"
                        );
                        break;
                    }
                }

                let delay = calculate_backoff(attempt, base_delay(&decoder, &reconnect), &reconnect);
                attempt += 1;
                delay
            }
        };

        tracing::debug!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    tracing::debug!("event stream loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Open one streaming response and decode it until it ends.
async fn connect_and_read(
    http: &reqwest::Client,
    url: &Url,
    decoder: &mut SseDecoder,
    listeners: &SharedListeners,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting to event stream");

    let mut request = http
        .get(url.clone())
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache");
    if let Some(id) = decoder.last_event_id() {
        request = request.header(LAST_EVENT_ID, id);
    }

    let response = request
        .send()
        .await
        .map_err(|e| Error::StreamConnect(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::StreamConnect(format!("server answered HTTP {status}")));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with(EVENT_STREAM_MIME) {
        tracing::debug!(content_type, "unexpected content type on event stream");
    }

    tracing::info!("event stream connected");
    notify(listeners, cancel, &StreamEvent::Open);

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| Error::StreamConnect(e.to_string()))?;
        for event in decoder.feed(&chunk) {
            tracing::trace!(event = %event.event, "event stream message");
            notify(listeners, cancel, &StreamEvent::Message(event));
        }
    }

    Ok(())
}

/// Deliver `event` to every listener registered under its name.
///
/// Listeners are cloned out of the table first so a listener may remove
/// registrations without deadlocking. Delivery stops at the first listener
/// that finds the handle shut down.
fn notify(listeners: &SharedListeners, cancel: &CancellationToken, event: &StreamEvent) {
    if cancel.is_cancelled() {
        return;
    }
    let matching = listeners
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .matching(event.name());
    for listener in matching {
        if cancel.is_cancelled() {
            tracing::debug!(event = %event.name(), "handle shut down mid-delivery");
            return;
        }
        listener(event);
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

fn base_delay(decoder: &SseDecoder, config: &ReconnectConfig) -> Duration {
    decoder.retry().unwrap_or(config.initial_delay)
}

/// Exponential backoff with jitter.
///
/// `delay = min(base * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, base: Duration, config: &ReconnectConfig) -> Duration {
    let exponent = i32::try_from(attempt.min(16)).unwrap_or(16);
    let scaled = base.as_secs_f64() * 2.0_f64.powi(exponent);
    let capped = scaled.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
