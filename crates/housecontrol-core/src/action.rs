//! Actions: the values the keypad hands to the application's state store.
//!
//! The keypad never owns alarm or garage-door state. Every update it learns
//! about, from the push stream, a snapshot fetch or a failed command, becomes
//! one [`Action`] passed to a [`Dispatch`] sink.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use tokio::sync::mpsc;

/// A state update for the shared application store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Action {
    /// New alarm status (opaque JSON from the server).
    AlarmUpdated(serde_json::Value),
    /// A user-visible error banner.
    AlarmError(String),
    /// The push stream connected; clears the "Connecting" display.
    AlarmConnected,
    /// New garage-door status (opaque; raw string when pushed).
    GarageDoorUpdated(serde_json::Value),
    /// A passcode recovered from the credential store. Serializes as
    /// [`REDACTED`].
    SetPasscode(#[serde(serialize_with = "redacted")] String),
}

/// Stand-in for secrets in serialized output.
pub const REDACTED: &str = "[REDACTED]";

fn redacted<S: Serializer>(_secret: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(REDACTED)
}

/// Synchronous, fire-and-forget sink for [`Action`]s.
pub trait Dispatch: Send + Sync {
    fn dispatch(&self, action: Action);
}

impl Dispatch for mpsc::UnboundedSender<Action> {
    fn dispatch(&self, action: Action) {
        // A closed receiver means the store is gone; nothing left to update.
        let _ = self.send(action);
    }
}

impl<D: Dispatch + ?Sized> Dispatch for Arc<D> {
    fn dispatch(&self, action: Action) {
        (**self).dispatch(action);
    }
}
