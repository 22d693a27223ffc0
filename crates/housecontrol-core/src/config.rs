// ── Runtime keypad configuration ──
//
// Describes *where* the house server lives and how to talk to it.
// Never touches disk: the CLI builds a `KeypadConfig` (usually through
// housecontrol-config) and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use housecontrol_api::transport::{TlsMode, TransportConfig};
use housecontrol_api::{HouseClient, ReconnectConfig};
use url::Url;

use crate::error::CoreError;

/// Key the passcode is stored under unless configured otherwise.
pub const DEFAULT_PASSCODE_STORAGE_KEY: &str = "housecontrol.passcode";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed home server).
    DangerAcceptInvalid,
}

/// Configuration for one keypad instance.
#[derive(Debug, Clone)]
pub struct KeypadConfig {
    /// House server base URL; `/stream` and `/status` hang off it.
    pub server_url: Url,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout for snapshot and command calls.
    pub timeout: Duration,
    /// Push-stream reconnection policy.
    pub reconnect: ReconnectConfig,
    /// Credential-store key holding the passcode.
    pub passcode_storage_key: String,
}

impl KeypadConfig {
    /// Configuration for `server_url` with default tuning.
    pub fn new(server_url: Url) -> Self {
        Self {
            server_url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            reconnect: ReconnectConfig::default(),
            passcode_storage_key: DEFAULT_PASSCODE_STORAGE_KEY.into(),
        }
    }

    /// Build the HTTP client described by this configuration.
    pub fn build_client(&self) -> Result<HouseClient, CoreError> {
        let transport = TransportConfig {
            tls: tls_to_transport(&self.tls),
            timeout: self.timeout,
        };
        Ok(HouseClient::new(self.server_url.clone(), &transport)?)
    }
}

fn tls_to_transport(tls: &TlsVerification) -> TlsMode {
    match tls {
        TlsVerification::SystemDefaults => TlsMode::System,
        TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
        TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
    }
}
