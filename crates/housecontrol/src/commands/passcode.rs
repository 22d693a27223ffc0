//! `passcode`: manage the keypad passcode in the system keyring.

use std::io::BufRead;

use housecontrol_config::{KeyringCredentialStore, store_passcode, stored_passcode};
use housecontrol_core::CredentialStore;
use secrecy::{ExposeSecret, SecretString};

use crate::cli::{GlobalOpts, PasscodeArgs, PasscodeCommand};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: PasscodeArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let key = config::effective_config(global)?.passcode_storage_key;
    let store = KeyringCredentialStore::new();
    let color = output::should_color(global.color);

    match args.command {
        PasscodeCommand::Set { stdin } => {
            let passcode = if stdin {
                read_stdin_line()?
            } else {
                rpassword::prompt_password("Passcode: ")?
            };
            let passcode = validate(passcode)?;
            store_passcode(&store, &key, &passcode)?;
            output::print_output(&output::done("Passcode stored in system keyring", color));
        }
        PasscodeCommand::Clear => {
            store.delete(&key)?;
            output::print_output(&output::done("Passcode removed", color));
        }
        PasscodeCommand::Status => {
            let state = if stored_passcode(&store, &key)?.is_some() {
                "stored"
            } else {
                "not stored"
            };
            output::print_output(&format!("Passcode ({key}): {state}"));
        }
    }
    Ok(())
}

fn read_stdin_line() -> Result<String, CliError> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn validate(raw: String) -> Result<SecretString, CliError> {
    let passcode = SecretString::from(raw);
    if passcode.expose_secret().trim().is_empty() {
        return Err(CliError::Validation {
            field: "passcode".into(),
            reason: "passcode cannot be empty".into(),
        });
    }
    Ok(passcode)
}
