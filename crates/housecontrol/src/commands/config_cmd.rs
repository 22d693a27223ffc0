//! Config subcommand handlers.

use dialoguer::{Confirm, Input};
use housecontrol_config::{Config, KeyringCredentialStore, config_path, save_config, store_passcode};
use secrecy::SecretString;
use serde_json::Value;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::effective_config(global)?;
            let out = output::render(global.output, &cfg, render_text);
            output::print_output(&out);
            Ok(())
        }
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string());
            Ok(())
        }
        ConfigCommand::Init => init(global),
    }
}

fn render_text(cfg: &Config) -> String {
    let Ok(Value::Object(map)) = serde_json::to_value(cfg) else {
        return format!("{cfg:#?}");
    };
    map.iter()
        .map(|(k, v)| format!("{k} = {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_path();
    let current = config::effective_config(global)?;
    eprintln!("housecontrol configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    let server_url: String = Input::new()
        .with_prompt("House server URL")
        .default(
            current
                .server_url
                .clone()
                .unwrap_or_else(|| "http://localhost:8080".into()),
        )
        .validate_with(|input: &String| -> Result<(), String> {
            url::Url::parse(input)
                .map(|_| ())
                .map_err(|e| format!("not a URL: {e}"))
        })
        .interact_text()
        .map_err(prompt_err)?;

    let timeout: u64 = Input::new()
        .with_prompt("Request timeout (seconds)")
        .default(current.timeout)
        .interact_text()
        .map_err(prompt_err)?;

    let insecure = Confirm::new()
        .with_prompt("Accept self-signed certificates?")
        .default(current.insecure)
        .interact()
        .map_err(prompt_err)?;

    let cfg = Config {
        server_url: Some(server_url),
        timeout,
        insecure,
        ..current
    };
    let written = save_config(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", written.display());

    let store_now = Confirm::new()
        .with_prompt("Store the keypad passcode in the system keyring now?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;
    if store_now {
        let passcode = rpassword::prompt_password("Passcode: ").map_err(prompt_err)?;
        if passcode.is_empty() {
            return Err(CliError::Validation {
                field: "passcode".into(),
                reason: "passcode cannot be empty".into(),
            });
        }
        store_passcode(
            &KeyringCredentialStore::new(),
            &cfg.passcode_storage_key,
            &SecretString::from(passcode),
        )?;
        eprintln!("   ✓ Passcode stored in system keyring");
    }

    eprintln!("\n  Test it: housecontrol status");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_rendering_lists_every_field() {
        let cfg = Config {
            server_url: Some("http://house.local".into()),
            ..Config::default()
        };
        let text = render_text(&cfg);
        assert!(text.contains(r#"server_url = "http://house.local""#), "{text}");
        assert!(text.contains("timeout = 30"), "{text}");
        assert!(text.contains(r#"passcode_storage_key = "housecontrol.passcode""#), "{text}");
    }
}
