// House server HTTP client
//
// Wraps `reqwest::Client` with URL construction for the status snapshot,
// the alarm and garage-door command endpoints, and the push stream.
// Command responses are not consumed: the resulting state arrives over
// the stream or through the next snapshot.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::stream::{ReconnectConfig, StreamHandle};
use crate::transport::TransportConfig;

/// Full current state of both domain objects as returned by `GET /status`.
///
/// Both halves are opaque: the client never looks inside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub alarm: serde_json::Value,
    #[serde(default)]
    pub garage_door: serde_json::Value,
}

/// Alarm panel arming commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmMode {
    Off,
    Away,
    Stay,
    Panic,
}

impl AlarmMode {
    fn path(self) -> &'static str {
        match self {
            Self::Off => "alarm/off",
            Self::Away => "alarm/away",
            Self::Stay => "alarm/stay",
            Self::Panic => "alarm/panic",
        }
    }
}

/// HTTP client for the house control server.
///
/// Requests carry no credentials. The keypad passcode lives in application
/// state only; any access control sits in front of the server.
#[derive(Debug, Clone)]
pub struct HouseClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
}

impl HouseClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root; `/status`, `/stream` and the command
    /// paths are appended to it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`, used for both
    /// request/response calls and the event stream.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            stream_http: http.clone(),
            http,
            base_url,
        }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path);
        Ok(Url::parse(&full)?)
    }

    /// The push-stream endpoint, `{base}/stream`.
    pub fn stream_url(&self) -> Result<Url, Error> {
        self.url("stream")
    }

    // ── Snapshot ─────────────────────────────────────────────────────

    /// Fetch the current alarm and garage-door status.
    ///
    /// `GET /status`
    pub async fn status(&self) -> Result<StatusSnapshot, Error> {
        let url = self.url("status")?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = Self::checked_body(resp).await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Set the alarm panel mode.
    ///
    /// `POST /alarm/{off|away|stay|panic}`
    pub async fn alarm(&self, mode: AlarmMode) -> Result<(), Error> {
        self.post_command(mode.path()).await
    }

    /// Disarm the alarm.
    pub async fn off(&self) -> Result<(), Error> {
        self.alarm(AlarmMode::Off).await
    }

    /// Arm the alarm in away mode.
    pub async fn away(&self) -> Result<(), Error> {
        self.alarm(AlarmMode::Away).await
    }

    /// Arm the alarm in stay mode.
    pub async fn stay(&self) -> Result<(), Error> {
        self.alarm(AlarmMode::Stay).await
    }

    /// Trigger the panic alarm.
    pub async fn panic(&self) -> Result<(), Error> {
        self.alarm(AlarmMode::Panic).await
    }

    /// Toggle the garage door.
    ///
    /// `POST /garage_door/toggle`
    pub async fn toggle(&self) -> Result<(), Error> {
        self.post_command("garage_door/toggle").await
    }

    // ── Stream ───────────────────────────────────────────────────────

    /// Open the server push stream at `{base}/stream`.
    ///
    /// Returns as soon as the background connection task is spawned.
    pub fn open_stream(
        &self,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
    ) -> Result<StreamHandle, Error> {
        let url = self.stream_url()?;
        Ok(StreamHandle::connect(
            self.stream_http.clone(),
            url,
            reconnect,
            cancel,
        ))
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn post_command(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let resp = self.http.post(url).send().await?;
        Self::checked_body(resp).await?;
        Ok(())
    }

    /// Read the body, turning non-success statuses into `Error::Api`.
    async fn checked_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_owned()
        } else {
            body
        };

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}
