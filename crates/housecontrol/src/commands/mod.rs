//! Command dispatch: bridges CLI args -> core commands -> output.

pub mod alarm;
pub mod config_cmd;
pub mod passcode;
pub mod shortcut;
pub mod status;
pub mod watch;

use housecontrol_core::KeypadConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a server-bound command to its handler.
pub async fn dispatch(
    cmd: Command,
    keypad: KeypadConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(&keypad, global).await,
        Command::Alarm(args) => alarm::handle_alarm(&keypad, args, global).await,
        Command::Garage(args) => alarm::handle_garage(&keypad, args, global).await,
        Command::Shortcut(args) => shortcut::handle(&keypad, args, global).await,
        Command::Watch(args) => watch::handle(keypad, args, global).await,
        // Handled before a server configuration is required
        Command::Passcode(_) | Command::Config(_) | Command::Completions(_) => {
            Err(CliError::Internal {
                message: "command does not talk to the house server".into(),
            })
        }
    }
}
