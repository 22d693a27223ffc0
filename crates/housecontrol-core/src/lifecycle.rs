// ── App lifecycle transitions ──
//
// The OS reports a coarse foreground state. The keypad reacts to *edges*
// between "active" and "not active", never to levels.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Coarse OS-reported application state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AppLifecycleState {
    Active,
    Inactive,
    Background,
}

impl AppLifecycleState {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

/// What the stream manager must do for one lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Came to the foreground: re-fetch the snapshot and reopen the stream.
    Resume,
    /// Left the foreground: close the stream.
    Suspend,
    /// No stream action.
    Nothing,
}

/// Pure edge detector for `prev -> next`.
pub fn transition(prev: AppLifecycleState, next: AppLifecycleState) -> Transition {
    match (prev.is_active(), next.is_active()) {
        (false, true) => Transition::Resume,
        (true, false) => Transition::Suspend,
        _ => Transition::Nothing,
    }
}
