// ── Keypad orchestration ──
//
// `Keypad::run` is the mounted screen: bootstrap, then one loop that owns
// the stream manager and the quick-action listener until unmount.
// `KeypadHandle` is the button panel the UI holds on to meanwhile.

use std::sync::Arc;

use housecontrol_api::HouseClient;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{Action, Dispatch};
use crate::bootstrap::{Navigator, StartupPhase, bootstrap};
use crate::command::{Command, spawn_commands};
use crate::config::KeypadConfig;
use crate::credentials::CredentialStore;
use crate::error::CoreError;
use crate::lifecycle::AppLifecycleState;
use crate::shortcut::{QuickAction, ShortcutRouter};
use crate::stream::StreamManager;
use crate::subscription::{Subscription, SubscriptionSet};

pub const PANIC_TITLE: &str = "Alarm Panic";
pub const PANIC_MESSAGE: &str = "Hang in there. Everything will be ok";

/// Modal alerts shown to the user.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
}

/// Event sources the host platform feeds the keypad.
pub struct PlatformSignals {
    /// Current foreground state; every change is one lifecycle event.
    pub lifecycle: watch::Receiver<AppLifecycleState>,
    /// Quick actions delivered while the keypad is live.
    pub quick_actions: mpsc::UnboundedReceiver<QuickAction>,
    /// The quick action the app was cold-launched with, if any.
    pub initial_action: Option<QuickAction>,
}

/// The keypad screen's controller.
pub struct Keypad {
    config: KeypadConfig,
    client: HouseClient,
    dispatch: Arc<dyn Dispatch>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    credentials: Arc<dyn CredentialStore>,
    cancel: CancellationToken,
}

impl Keypad {
    pub fn new(
        config: KeypadConfig,
        dispatch: Arc<dyn Dispatch>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self {
            config,
            client,
            dispatch,
            navigator,
            notifier,
            credentials,
            cancel: CancellationToken::new(),
        })
    }

    /// A handle for buttons and unmounting. Cheap to clone.
    pub fn handle(&self) -> KeypadHandle {
        KeypadHandle {
            client: self.client.clone(),
            dispatch: Arc::clone(&self.dispatch),
            notifier: Arc::clone(&self.notifier),
            cancel: self.cancel.clone(),
        }
    }

    /// Mount the keypad and drive it until unmounted.
    ///
    /// Returns early with [`StartupPhase::PasscodeRequired`] when no
    /// passcode can be found; nothing is opened in that case. Unmounting
    /// before bootstrap finishes returns [`StartupPhase::Bootstrapping`]
    /// without dispatching, opening or issuing anything.
    pub async fn run(self, signals: PlatformSignals, known_passcode: Option<&str>) -> StartupPhase {
        let phase = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                debug!("unmounted during bootstrap");
                return StartupPhase::Bootstrapping;
            }
            phase = bootstrap(
                known_passcode,
                Arc::clone(&self.credentials),
                &self.config.passcode_storage_key,
                &*self.dispatch,
                &*self.navigator,
            ) => phase,
        };
        if phase != StartupPhase::SteadyState {
            return phase;
        }
        if self.cancel.is_cancelled() {
            debug!("unmounted right after bootstrap, not going live");
            return phase;
        }

        let PlatformSignals {
            mut lifecycle,
            quick_actions,
            initial_action,
        } = signals;

        let initial = *lifecycle.borrow_and_update();
        let mut manager = StreamManager::new(
            self.client.clone(),
            self.config.reconnect.clone(),
            Arc::clone(&self.dispatch),
            initial,
            self.cancel.child_token(),
        );
        if let Err(e) = manager.open() {
            warn!(error = %e, "could not open push stream");
            self.dispatch.dispatch(Action::AlarmError(e.to_string()));
        }

        let router = ShortcutRouter::new(
            self.client.clone(),
            Arc::clone(&self.dispatch),
            self.cancel.child_token(),
        );
        let mut listeners = SubscriptionSet::new();
        let listener_cancel = self.cancel.child_token();
        let listener = tokio::spawn(listen_quick_actions(
            router.clone(),
            quick_actions,
            listener_cancel.clone(),
        ));
        listeners.push(Subscription::task("quick_actions", listener_cancel, listener));

        router.route(initial_action.as_ref());
        manager.refresh_status();

        info!(server = %self.config.server_url, "keypad mounted");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                changed = lifecycle.changed() => {
                    if changed.is_err() {
                        debug!("lifecycle source closed, waiting for unmount");
                        self.cancel.cancelled().await;
                        break;
                    }
                    let next = *lifecycle.borrow_and_update();
                    manager.on_lifecycle_change(next);
                }
            }
        }

        let removed = listeners.remove_all();
        manager.shutdown();
        info!(listeners = removed, "keypad unmounted");

        StartupPhase::SteadyState
    }
}

async fn listen_quick_actions(
    router: ShortcutRouter,
    mut actions: mpsc::UnboundedReceiver<QuickAction>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            action = actions.recv() => match action {
                Some(action) => {
                    router.route(Some(&action));
                }
                None => break,
            },
        }
    }
}

/// Buttons and teardown for a mounted keypad.
#[derive(Clone)]
pub struct KeypadHandle {
    client: HouseClient,
    dispatch: Arc<dyn Dispatch>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl KeypadHandle {
    /// Trigger the panic alarm and reassure the user right away.
    ///
    /// The request is not awaited; a failure arrives as `AlarmError`.
    pub fn panic(&self) -> JoinHandle<()> {
        let task = self.send(Command::AlarmPanic);
        self.notifier.alert(PANIC_TITLE, PANIC_MESSAGE);
        task
    }

    /// Issue one command in the background.
    pub fn send(&self, command: Command) -> JoinHandle<()> {
        spawn_commands(
            self.client.clone(),
            vec![command],
            Arc::clone(&self.dispatch),
            self.cancel.child_token(),
        )
    }

    /// Stop the run loop and release everything it holds. Idempotent.
    pub fn unmount(&self) {
        self.cancel.cancel();
    }

    pub fn is_unmounted(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
