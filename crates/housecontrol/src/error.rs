//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use housecontrol_config::ConfigError;
use housecontrol_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the house server at {url}")]
    #[diagnostic(
        code(housecontrol::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Try: housecontrol status --server http://<host>:<port>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(housecontrol::timeout),
        help("Increase the timeout with --timeout or check the server's load.")
    )]
    Timeout { seconds: u64 },

    // ── Server ───────────────────────────────────────────────────────
    #[error("House server refused the request (HTTP {status})")]
    #[diagnostic(
        code(housecontrol::unauthorized),
        help(
            "The server or a proxy in front of it denied access.\n\
             housecontrol does not send credentials; check the proxy's access rules."
        )
    )]
    Unauthorized { status: u16 },

    #[error("House server rejected the request (HTTP {status}): {message}")]
    #[diagnostic(code(housecontrol::rejected))]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from the house server: {message}")]
    #[diagnostic(code(housecontrol::invalid_response))]
    InvalidResponse { message: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("No house server configured")]
    #[diagnostic(
        code(housecontrol::no_server),
        help(
            "Create a config with: housecontrol config init\n\
             Or pass --server, or set HOUSECONTROL_SERVER_URL.\n\
             Expected config at: {path}"
        )
    )]
    NoServer { path: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(housecontrol::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(housecontrol::config))]
    Config(ConfigError),

    #[error("No keypad passcode stored")]
    #[diagnostic(
        code(housecontrol::no_passcode),
        help("Store one with: housecontrol passcode set")
    )]
    NoPasscode,

    #[error("Credential store error: {message}")]
    #[diagnostic(
        code(housecontrol::credentials),
        help("Check that a system keyring (Keychain, Secret Service, Credential Manager) is available.")
    )]
    Credentials { message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(housecontrol::internal))]
    Internal { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    #[diagnostic(code(housecontrol::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Unauthorized { .. } | Self::NoPasscode => exit_code::AUTH,
            Self::Validation { .. } | Self::NoServer { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::Rejected { status, .. } if matches!(status, 401 | 403) => {
                CliError::Unauthorized { status }
            }
            CoreError::Rejected { status, message } => CliError::Rejected { status, message },
            CoreError::InvalidResponse { message } => CliError::InvalidResponse { message },
            CoreError::Credentials { message } => CliError::Credentials { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => CliError::Internal { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoServer => CliError::NoServer {
                path: housecontrol_config::config_path().display().to_string(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
