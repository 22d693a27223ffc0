// ── Command API ──
//
// Every remote write (alarm mode, garage door) flows through `Command`.
// Commands are fire-and-forget from the keypad's point of view: their
// effect shows up on the push stream or in the next snapshot.

use std::sync::Arc;

use housecontrol_api::{AlarmMode, HouseClient};
use strum::{Display, EnumString};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::action::{Action, Dispatch};
use crate::error::CoreError;

/// A remote command against the house server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    AlarmOff,
    AlarmAway,
    AlarmStay,
    AlarmPanic,
    GarageToggle,
}

/// Execute one command and wait for the server to accept it.
pub async fn execute(client: &HouseClient, cmd: Command) -> Result<(), CoreError> {
    debug!(command = %cmd, "executing command");
    match cmd {
        Command::AlarmOff => client.alarm(AlarmMode::Off).await?,
        Command::AlarmAway => client.alarm(AlarmMode::Away).await?,
        Command::AlarmStay => client.alarm(AlarmMode::Stay).await?,
        Command::AlarmPanic => client.alarm(AlarmMode::Panic).await?,
        Command::GarageToggle => client.toggle().await?,
    }
    Ok(())
}

/// Issue `commands` in order from a background task.
///
/// A failed command is logged and dispatched as [`Action::AlarmError`]
/// and does not stop the ones after it. Once `cancel` fires no further
/// request is sent, the one in flight is dropped, and nothing is dispatched.
pub(crate) fn spawn_commands(
    client: HouseClient,
    commands: Vec<Command>,
    dispatch: Arc<dyn Dispatch>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        for cmd in commands {
            if cancel.is_cancelled() {
                debug!(command = %cmd, "cancelled, skipping remaining commands");
                break;
            }
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(command = %cmd, "cancelled while in flight");
                    break;
                }
                result = execute(&client, cmd) => result,
            };
            if let Err(e) = result {
                warn!(command = %cmd, error = %e, "command failed");
                if !cancel.is_cancelled() {
                    dispatch.dispatch(Action::AlarmError(e.to_string()));
                }
            }
        }
    })
}
