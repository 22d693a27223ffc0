// housecontrol-core: Keypad state synchronization between housecontrol-api and its hosts (CLI/apps).

pub mod action;
pub mod bootstrap;
pub mod command;
pub mod config;
pub mod credentials;
pub mod error;
pub mod keypad;
pub mod lifecycle;
pub mod shortcut;
pub mod stream;
pub mod subscription;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{Action, Dispatch, REDACTED};
pub use bootstrap::{Navigator, Route, StartupPhase};
pub use command::{Command, execute};
pub use config::{DEFAULT_PASSCODE_STORAGE_KEY, KeypadConfig, TlsVerification};
pub use credentials::{CredentialStore, MemoryCredentialStore, read_passcode};
pub use error::CoreError;
pub use keypad::{Keypad, KeypadHandle, Notifier, PANIC_MESSAGE, PANIC_TITLE, PlatformSignals};
pub use lifecycle::{AppLifecycleState, Transition, transition};
pub use shortcut::{ARRIVE, LEAVE, QuickAction, Shortcut, ShortcutRouter};
pub use stream::StreamManager;
pub use subscription::{Subscription, SubscriptionSet};
