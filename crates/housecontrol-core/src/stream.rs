// ── Stream lifecycle manager ──
//
// Owns the single push-stream connection and keeps it in step with the
// app's foreground state. Push events and snapshot fetches both end up
// as dispatched actions; whichever dispatch lands last wins.

use std::sync::Arc;

use housecontrol_api::{HouseClient, ReconnectConfig, StreamEvent, StreamHandle};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{Action, Dispatch};
use crate::error::CoreError;
use crate::lifecycle::{AppLifecycleState, Transition, transition};
use crate::subscription::SubscriptionSet;

/// Server event types the keypad listens for.
pub const STATUS_EVENT: &str = "status";
pub const GARAGE_DOOR_EVENT: &str = "garage_door";
pub const ERROR_EVENT: &str = "error";
pub const OPEN_EVENT: &str = "open";

/// Keeps at most one push-stream connection alive and resynchronizes
/// state whenever the app comes back to the foreground.
pub struct StreamManager {
    client: HouseClient,
    reconnect: ReconnectConfig,
    dispatch: Arc<dyn Dispatch>,
    /// Parent of every token this manager hands out.
    cancel: CancellationToken,
    lifecycle: AppLifecycleState,
    handle: Option<StreamHandle>,
    subscriptions: SubscriptionSet,
    /// Token of the snapshot fetch currently in flight, if any.
    refresh: Option<CancellationToken>,
}

impl StreamManager {
    pub fn new(
        client: HouseClient,
        reconnect: ReconnectConfig,
        dispatch: Arc<dyn Dispatch>,
        initial: AppLifecycleState,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            reconnect,
            dispatch,
            cancel,
            lifecycle: initial,
            handle: None,
            subscriptions: SubscriptionSet::new(),
            refresh: None,
        }
    }

    /// The last lifecycle state seen.
    pub fn lifecycle(&self) -> AppLifecycleState {
        self.lifecycle
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Live stream listener registrations.
    pub fn registration_count(&self) -> usize {
        self.subscriptions.len()
    }

    // ── Connection ───────────────────────────────────────────────────

    /// Open a fresh connection with the four keypad handlers installed.
    ///
    /// Any live connection is closed first. Returns the number of
    /// registrations made. Does not wait for the server.
    pub fn open(&mut self) -> Result<usize, CoreError> {
        self.close();

        let mut handle = self
            .client
            .open_stream(self.reconnect.clone(), self.cancel.child_token())?;

        let registrations = [
            handle.add_listener(STATUS_EVENT, on_status(Arc::clone(&self.dispatch))),
            handle.add_listener(GARAGE_DOOR_EVENT, on_garage_door(Arc::clone(&self.dispatch))),
            handle.add_listener(ERROR_EVENT, on_error(Arc::clone(&self.dispatch))),
            handle.add_listener(OPEN_EVENT, on_open(Arc::clone(&self.dispatch))),
        ];
        let count = registrations.len();
        self.subscriptions.extend(registrations);

        handle.start();
        self.handle = Some(handle);

        info!(registrations = count, "push stream opened");
        Ok(count)
    }

    /// Tear down the current connection. Safe when nothing is open.
    pub fn close(&mut self) {
        let removed = self.subscriptions.remove_all();
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            info!(registrations = removed, "push stream closed");
        }
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Fetch `/status` in the background and dispatch both halves.
    ///
    /// Supersedes a fetch still in flight. The result is dropped if this
    /// fetch is superseded or the manager shuts down before it lands.
    pub fn refresh_status(&mut self) -> JoinHandle<()> {
        if let Some(previous) = self.refresh.take() {
            previous.cancel();
        }
        let token = self.cancel.child_token();
        self.refresh = Some(token.clone());

        let client = self.client.clone();
        let dispatch = Arc::clone(&self.dispatch);

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = token.cancelled() => return,
                result = client.status() => result,
            };
            if token.is_cancelled() {
                debug!("dropping superseded status snapshot");
                return;
            }

            match result {
                Ok(snapshot) => {
                    dispatch.dispatch(Action::AlarmUpdated(snapshot.alarm));
                    dispatch.dispatch(Action::GarageDoorUpdated(snapshot.garage_door));
                }
                Err(e) => {
                    let err = CoreError::from(e);
                    warn!(error = %err, "status refresh failed");
                    dispatch.dispatch(Action::AlarmError(err.to_string()));
                }
            }
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// React to an OS lifecycle change and remember `next`.
    pub fn on_lifecycle_change(&mut self, next: AppLifecycleState) -> Transition {
        let step = transition(self.lifecycle, next);
        debug!(prev = %self.lifecycle, next = %next, ?step, "lifecycle change");

        match step {
            Transition::Resume => {
                self.refresh_status();
                if let Err(e) = self.open() {
                    warn!(error = %e, "could not reopen push stream");
                    self.dispatch.dispatch(Action::AlarmError(e.to_string()));
                }
            }
            Transition::Suspend => self.close(),
            Transition::Nothing => {}
        }

        self.lifecycle = next;
        step
    }

    /// Close the stream and drop any fetch in flight. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(refresh) = self.refresh.take() {
            refresh.cancel();
        }
        self.close();
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Event handlers ───────────────────────────────────────────────────

fn on_status(dispatch: Arc<dyn Dispatch>) -> impl Fn(&StreamEvent) + Send + Sync + 'static {
    move |event: &StreamEvent| {
        let StreamEvent::Message(msg) = event else {
            return;
        };
        match serde_json::from_str::<Value>(&msg.data) {
            Ok(status) => dispatch.dispatch(Action::AlarmUpdated(status)),
            Err(e) => warn!(error = %e, data = %msg.data, "unparseable status event"),
        }
    }
}

fn on_garage_door(dispatch: Arc<dyn Dispatch>) -> impl Fn(&StreamEvent) + Send + Sync + 'static {
    move |event: &StreamEvent| {
        if let StreamEvent::Message(msg) = event {
            dispatch.dispatch(Action::GarageDoorUpdated(Value::String(msg.data.clone())));
        }
    }
}

fn on_error(dispatch: Arc<dyn Dispatch>) -> impl Fn(&StreamEvent) + Send + Sync + 'static {
    move |event: &StreamEvent| {
        let message = match event {
            StreamEvent::Error { message } => message.clone(),
            StreamEvent::Message(msg) => error_message(&msg.data),
            StreamEvent::Open => return,
        };
        dispatch.dispatch(Action::AlarmError(message));
    }
}

fn on_open(dispatch: Arc<dyn Dispatch>) -> impl Fn(&StreamEvent) + Send + Sync + 'static {
    move |event: &StreamEvent| {
        if matches!(event, StreamEvent::Open) {
            dispatch.dispatch(Action::AlarmConnected);
        }
    }
}

/// `message` of a JSON error body, or the raw body otherwise.
fn error_message(data: &str) -> String {
    serde_json::from_str::<Value>(data)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| {
            if data.trim().is_empty() {
                "event stream error".to_owned()
            } else {
                data.to_owned()
            }
        })
}

#[cfg(test)]
mod tests {
    use housecontrol_api::MessageEvent;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;

    fn message(event: &str, data: &str) -> StreamEvent {
        StreamEvent::Message(MessageEvent {
            event: event.into(),
            data: data.into(),
            id: None,
        })
    }

    fn sink() -> (Arc<dyn Dispatch>, mpsc::UnboundedReceiver<Action>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(tx), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Action>) -> Vec<Action> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[test]
    fn status_event_dispatches_parsed_json() {
        let (dispatch, mut rx) = sink();
        on_status(dispatch)(&message("status", r#"{"ready":true}"#));

        assert_eq!(drain(&mut rx), vec![Action::AlarmUpdated(json!({ "ready": true }))]);
    }

    #[test]
    fn malformed_status_event_is_dropped() {
        let (dispatch, mut rx) = sink();
        on_status(dispatch)(&message("status", "{not json"));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn garage_door_event_is_forwarded_raw() {
        let (dispatch, mut rx) = sink();
        on_garage_door(dispatch)(&message("garage_door", r#"{"status":"open"}"#));

        assert_eq!(
            drain(&mut rx),
            vec![Action::GarageDoorUpdated(Value::String(
                r#"{"status":"open"}"#.into()
            ))]
        );
    }

    #[test]
    fn error_events_carry_their_message() {
        let (dispatch, mut rx) = sink();
        let handler = on_error(dispatch);

        handler(&StreamEvent::Error {
            message: "connection reset".into(),
        });
        handler(&message("error", r#"{"message":"panel offline"}"#));
        handler(&message("error", "plain text"));
        handler(&StreamEvent::Open);

        assert_eq!(
            drain(&mut rx),
            vec![
                Action::AlarmError("connection reset".into()),
                Action::AlarmError("panel offline".into()),
                Action::AlarmError("plain text".into()),
            ]
        );
    }

    #[test]
    fn open_event_dispatches_connected() {
        let (dispatch, mut rx) = sink();
        on_open(dispatch)(&StreamEvent::Open);
        assert_eq!(drain(&mut rx), vec![Action::AlarmConnected]);
    }

    #[test]
    fn empty_error_body_gets_a_generic_message() {
        assert_eq!(error_message(""), "event stream error");
        assert_eq!(error_message(r#"{"code":5}"#), r#"{"code":5}"#);
    }
}
