// ── Home-screen quick actions ──
//
// The launcher delivers a quick action either at cold start or while the
// keypad is live. Each known action expands to a fixed command sequence.

use std::sync::Arc;

use housecontrol_api::HouseClient;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::action::Dispatch;
use crate::command::{Command, spawn_commands};

pub const LEAVE: &str = "com.housecontrol.app.leave";
pub const ARRIVE: &str = "com.housecontrol.app.arrive";

/// A launcher shortcut invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAction {
    #[serde(rename = "type")]
    pub type_: String,
}

impl QuickAction {
    pub fn new(type_: impl Into<String>) -> Self {
        Self { type_: type_.into() }
    }
}

/// Shortcuts the keypad understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    Leave,
    Arrive,
}

impl Shortcut {
    pub fn from_type(type_: &str) -> Option<Self> {
        match type_ {
            LEAVE => Some(Self::Leave),
            ARRIVE => Some(Self::Arrive),
            _ => None,
        }
    }

    /// Commands in issuance order.
    pub fn commands(self) -> Vec<Command> {
        match self {
            Self::Leave => vec![Command::AlarmAway, Command::GarageToggle],
            Self::Arrive => vec![Command::AlarmOff, Command::GarageToggle],
        }
    }
}

/// Maps quick actions to command sequences and issues them.
#[derive(Clone)]
pub struct ShortcutRouter {
    client: HouseClient,
    dispatch: Arc<dyn Dispatch>,
    cancel: CancellationToken,
}

impl ShortcutRouter {
    pub fn new(client: HouseClient, dispatch: Arc<dyn Dispatch>, cancel: CancellationToken) -> Self {
        Self {
            client,
            dispatch,
            cancel,
        }
    }

    /// Route one quick action. Returns the spawned command task, or `None`
    /// when there was nothing to do.
    pub fn route(&self, action: Option<&QuickAction>) -> Option<(Shortcut, JoinHandle<()>)> {
        let action = action?;
        let Some(shortcut) = Shortcut::from_type(&action.type_) else {
            debug!(kind = %action.type_, "ignoring unknown quick action");
            return None;
        };

        info!(?shortcut, "running quick action");
        let task = spawn_commands(
            self.client.clone(),
            shortcut.commands(),
            Arc::clone(&self.dispatch),
            self.cancel.child_token(),
        );
        Some((shortcut, task))
    }
}
