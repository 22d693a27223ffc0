//! `shortcut`: run a quick action's command sequence in the foreground.

use housecontrol_core::{ARRIVE, KeypadConfig, LEAVE, Shortcut};
use tracing::warn;

use crate::cli::{GlobalOpts, ShortcutArgs};
use crate::error::CliError;

use super::alarm;

/// Expand `leave` / `arrive` to their type identifiers.
pub fn shortcut_type(kind: &str) -> &str {
    match kind {
        "leave" => LEAVE,
        "arrive" => ARRIVE,
        other => other,
    }
}

pub async fn handle(
    keypad: &KeypadConfig,
    args: ShortcutArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let Some(shortcut) = Shortcut::from_type(shortcut_type(&args.kind)) else {
        eprintln!("Unknown shortcut '{}', nothing to do", args.kind);
        return Ok(());
    };

    // Every command is attempted; the first failure is reported at the end
    let mut first_error = None;
    for command in shortcut.commands() {
        if let Err(e) = alarm::run(keypad, command, global).await {
            warn!(%command, error = %e, "shortcut step failed");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
