//! `alarm` and `garage` handlers: one command each, awaited.

use housecontrol_core::{Command, KeypadConfig, PANIC_MESSAGE, PANIC_TITLE, execute};
use owo_colors::OwoColorize;
use serde_json::json;

use crate::cli::{AlarmArgs, AlarmCommand, GarageArgs, GarageCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle_alarm(
    keypad: &KeypadConfig,
    args: AlarmArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let command = match args.command {
        AlarmCommand::Off => Command::AlarmOff,
        AlarmCommand::Away => Command::AlarmAway,
        AlarmCommand::Stay => Command::AlarmStay,
        AlarmCommand::Panic => Command::AlarmPanic,
    };

    if command == Command::AlarmPanic {
        // Reassure first; the request may take a while
        let color = output::should_color(global.color);
        if color {
            eprintln!("{} {PANIC_MESSAGE}", format!("{PANIC_TITLE}:").red().bold());
        } else {
            eprintln!("{PANIC_TITLE}: {PANIC_MESSAGE}");
        }
    }

    run(keypad, command, global).await
}

pub async fn handle_garage(
    keypad: &KeypadConfig,
    args: GarageArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GarageCommand::Toggle => run(keypad, Command::GarageToggle, global).await,
    }
}

/// Execute `command` and report it.
pub(crate) async fn run(
    keypad: &KeypadConfig,
    command: Command,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let client = keypad.build_client()?;
    execute(&client, command).await?;

    let color = output::should_color(global.color);
    let out = output::render(
        global.output,
        &json!({ "command": command.to_string(), "ok": true }),
        |_| output::done(&format!("{command} accepted"), color),
    );
    output::print_output(&out);
    Ok(())
}
