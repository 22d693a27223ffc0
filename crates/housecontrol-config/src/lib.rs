//! Configuration for the housecontrol CLI.
//!
//! A flat TOML file plus `HOUSECONTROL_*` environment overrides, the OS
//! keyring as passcode storage, and translation to
//! `housecontrol_core::KeypadConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use housecontrol_api::ReconnectConfig;
use housecontrol_core::{
    CoreError, CredentialStore, DEFAULT_PASSCODE_STORAGE_KEY, KeypadConfig, TlsVerification,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service every housecontrol secret is filed under.
pub const KEYRING_SERVICE: &str = "housecontrol";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no house server configured")]
    NoServer,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// House server base URL (e.g., "http://house.local:8080").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// Keyring entry holding the passcode.
    #[serde(default = "default_storage_key")]
    pub passcode_storage_key: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,

    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,

    /// Give up after this many failed reconnects; unset retries forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_max_retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: None,
            passcode_storage_key: default_storage_key(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_max_retries: None,
        }
    }
}

fn default_storage_key() -> String {
    DEFAULT_PASSCODE_STORAGE_KEY.into()
}
fn default_timeout() -> u64 {
    30
}
fn default_reconnect_initial_ms() -> u64 {
    1_000
}
fn default_reconnect_max_ms() -> u64 {
    30_000
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "housecontrol", "housecontrol").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("housecontrol");
    p
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load `path` (missing is fine) merged with `HOUSECONTROL_*` variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("HOUSECONTROL_"))
        .extract()?;
    Ok(config)
}

/// Write `cfg` to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Validate `cfg` and build the keypad's runtime configuration.
pub fn to_keypad_config(cfg: &Config) -> Result<KeypadConfig, ConfigError> {
    let raw = cfg.server_url.as_deref().ok_or(ConfigError::NoServer)?;
    let server_url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "server_url".into(),
        reason: format!("{e}: {raw}"),
    })?;
    if !matches!(server_url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "server_url".into(),
            reason: format!("expected http or https, got '{}'", server_url.scheme()),
        });
    }

    if cfg.timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }
    if cfg.reconnect_initial_ms == 0 || cfg.reconnect_max_ms < cfg.reconnect_initial_ms {
        return Err(ConfigError::Validation {
            field: "reconnect_max_ms".into(),
            reason: format!(
                "need 0 < reconnect_initial_ms ({}) <= reconnect_max_ms ({})",
                cfg.reconnect_initial_ms, cfg.reconnect_max_ms
            ),
        });
    }
    if cfg.passcode_storage_key.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "passcode_storage_key".into(),
            reason: "must not be empty".into(),
        });
    }

    let tls = if cfg.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = cfg.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(KeypadConfig {
        server_url,
        tls,
        timeout: Duration::from_secs(cfg.timeout),
        reconnect: ReconnectConfig {
            initial_delay: Duration::from_millis(cfg.reconnect_initial_ms),
            max_delay: Duration::from_millis(cfg.reconnect_max_ms),
            max_retries: cfg.reconnect_max_retries,
        },
        passcode_storage_key: cfg.passcode_storage_key.clone(),
    })
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Passcode storage in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(&self.service, key).map_err(keyring_error)
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(keyring_error(e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entry(key)?.set_password(value).map_err(keyring_error)
    }

    fn delete(&self, key: &str) -> Result<(), CoreError> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_error(e)),
        }
    }
}

fn keyring_error(err: keyring::Error) -> CoreError {
    CoreError::Credentials {
        message: err.to_string(),
    }
}

/// Read the stored passcode, keeping it out of logs and debug output.
pub fn stored_passcode(
    store: &dyn CredentialStore,
    key: &str,
) -> Result<Option<SecretString>, CoreError> {
    Ok(store.get(key)?.map(SecretString::from))
}

/// Persist `passcode` under `key`.
pub fn store_passcode(
    store: &dyn CredentialStore,
    key: &str,
    passcode: &SecretString,
) -> Result<(), CoreError> {
    store.set(key, passcode.expose_secret())
}
