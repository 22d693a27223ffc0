#![allow(clippy::unwrap_used)]
// Config file and environment round-trips.

use std::time::Duration;

use figment::Jail;
use pretty_assertions::assert_eq;

use housecontrol_config::{Config, load_config_from, save_config_to, to_keypad_config};

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let cfg = Config {
        server_url: Some("http://house.local:8080".into()),
        timeout: 10,
        reconnect_max_retries: Some(5),
        ..Config::default()
    };
    save_config_to(&cfg, &path).unwrap();

    Jail::expect_with(|_jail| {
        let loaded = load_config_from(&path).map_err(|e| e.to_string())?;
        assert_eq!(loaded, cfg);
        Ok(())
    });
}

#[test]
fn test_missing_file_yields_defaults() {
    Jail::expect_with(|jail| {
        let loaded =
            load_config_from(&jail.directory().join("absent.toml")).map_err(|e| e.to_string())?;
        assert_eq!(loaded, Config::default());
        Ok(())
    });
}

#[test]
fn test_environment_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
                server_url = "http://from-file:8080"
                timeout = 12
                reconnect_initial_ms = 250
            "#,
        )?;
        jail.set_env("HOUSECONTROL_SERVER_URL", "http://from-env:9090");
        jail.set_env("HOUSECONTROL_RECONNECT_MAX_RETRIES", "3");

        let loaded =
            load_config_from(&jail.directory().join("config.toml")).map_err(|e| e.to_string())?;
        assert_eq!(loaded.server_url.as_deref(), Some("http://from-env:9090"));
        assert_eq!(loaded.timeout, 12);

        let keypad = to_keypad_config(&loaded).map_err(|e| e.to_string())?;
        assert_eq!(keypad.timeout, Duration::from_secs(12));
        assert_eq!(keypad.reconnect.initial_delay, Duration::from_millis(250));
        assert_eq!(keypad.reconnect.max_retries, Some(3));
        Ok(())
    });
}

#[test]
fn test_malformed_file_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "timeout = \"soon\"")?;
        assert!(load_config_from(&jail.directory().join("config.toml")).is_err());
        Ok(())
    });
}
