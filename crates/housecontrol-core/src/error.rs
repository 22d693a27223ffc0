// ── Core error types ──
//
// Errors surfaced by housecontrol-core. Inside the keypad these never
// propagate: they are logged and dispatched as `Action::AlarmError`.
// The one-shot helpers used by the CLI return them directly.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to house server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("House server request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Server errors ────────────────────────────────────────────────
    #[error("House server rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unexpected response from house server: {message}")]
    InvalidResponse { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("Credential store error: {message}")]
    Credentials { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<housecontrol_api::Error> for CoreError {
    fn from(err: housecontrol_api::Error) -> Self {
        use housecontrol_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if let Some(status) = e.status() {
                    CoreError::Rejected {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Api { status, message } => CoreError::Rejected { status, message },
            ApiError::StreamConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("event stream: {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_rejection_keeps_status() {
        let err = CoreError::from(housecontrol_api::Error::Api {
            status: 403,
            message: "wrong passcode".into(),
        });
        assert!(matches!(err, CoreError::Rejected { status: 403, .. }));
        assert_eq!(
            err.to_string(),
            "House server rejected the request (HTTP 403): wrong passcode"
        );
    }

    #[test]
    fn bad_json_is_invalid_response() {
        let err = CoreError::from(housecontrol_api::Error::Deserialization {
            message: "expected value".into(),
            body: "nope".into(),
        });
        assert!(matches!(err, CoreError::InvalidResponse { .. }));
    }
}
