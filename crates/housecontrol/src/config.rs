//! `GlobalOpts`-aware wrappers over housecontrol-config.

use housecontrol_config::{Config, load_config, to_keypad_config};
use housecontrol_core::KeypadConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Effective configuration: file, then environment, then CLI flags.
pub fn effective_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        cfg.server_url = Some(server.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
}

/// Build the keypad configuration for server-bound commands.
pub fn keypad_config(global: &GlobalOpts) -> Result<KeypadConfig, CliError> {
    let cfg = effective_config(global)?;
    Ok(to_keypad_config(&cfg)?)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    #[test]
    fn flags_override_file_values() {
        let cli = Cli::parse_from([
            "housecontrol",
            "--server",
            "http://flag:1",
            "--timeout",
            "5",
            "-k",
            "status",
        ]);
        let mut cfg = Config {
            server_url: Some("http://file:2".into()),
            ..Config::default()
        };
        apply_overrides(&mut cfg, &cli.global);

        assert_eq!(cfg.server_url.as_deref(), Some("http://flag:1"));
        assert_eq!(cfg.timeout, 5);
        assert!(cfg.insecure);
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let cli = Cli::parse_from(["housecontrol", "status"]);
        let mut cfg = Config {
            server_url: Some("http://file:2".into()),
            timeout: 9,
            ..Config::default()
        };
        apply_overrides(&mut cfg, &cli.global);

        assert_eq!(cfg.server_url.as_deref(), Some("http://file:2"));
        assert_eq!(cfg.timeout, 9);
        assert!(!cfg.insecure);
    }
}
