// housecontrol-api: Async Rust client for the house control server (REST + SSE)

pub mod client;
pub mod error;
pub mod stream;
pub mod transport;

pub use client::{AlarmMode, HouseClient, StatusSnapshot};
pub use error::Error;
pub use stream::{MessageEvent, ReconnectConfig, Registration, StreamEvent, StreamHandle};
pub use transport::{TlsMode, TransportConfig};
