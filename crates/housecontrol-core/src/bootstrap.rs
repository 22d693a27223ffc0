// ── Startup sequencing ──
//
// Decides whether the keypad can go live. Without a passcode nothing
// else on the screen works, so the stream is never opened in that case.

use std::sync::Arc;

use tracing::{debug, info};

use crate::action::{Action, Dispatch};
use crate::credentials::{CredentialStore, read_passcode};

/// Where the keypad is in its startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    /// Resolving the passcode.
    Bootstrapping,
    /// No passcode anywhere; the user was sent to capture one.
    PasscodeRequired,
    /// Passcode known; stream and listeners are (or may be) live.
    SteadyState,
}

/// Screens the keypad can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    PasscodeCapture,
}

/// Navigation side effects.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Resolve the passcode and pick the next phase.
///
/// A non-empty `known_passcode` wins outright. Otherwise the credential
/// store is consulted: a stored value (even an empty one) is dispatched
/// as [`Action::SetPasscode`]; no value routes to passcode capture.
pub async fn bootstrap(
    known_passcode: Option<&str>,
    store: Arc<dyn CredentialStore>,
    storage_key: &str,
    dispatch: &dyn Dispatch,
    navigator: &dyn Navigator,
) -> StartupPhase {
    if known_passcode.is_some_and(|code| !code.is_empty()) {
        debug!("passcode already known, skipping credential store");
        return StartupPhase::SteadyState;
    }

    if let Some(passcode) = read_passcode(store, storage_key).await {
        debug!("restored passcode from credential store");
        dispatch.dispatch(Action::SetPasscode(passcode));
        StartupPhase::SteadyState
    } else {
        info!("no stored passcode, routing to passcode capture");
        navigator.navigate(Route::PasscodeCapture);
        StartupPhase::PasscodeRequired
    }
}
