//! `watch`: mount a live keypad in the terminal.
//!
//! Every dispatched action is printed (one JSON object per line with
//! `--output json`). Lines on stdin play the host platform: lifecycle
//! states, quick actions and keypad buttons. Ctrl-C or `quit` unmounts.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use housecontrol_config::KeyringCredentialStore;
use housecontrol_core::{
    Action, AppLifecycleState, Command, Keypad, KeypadConfig, KeypadHandle, Navigator, Notifier,
    PlatformSignals, QuickAction, Route, StartupPhase,
};
use owo_colors::OwoColorize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

use super::shortcut::shortcut_type;

// ── Terminal stand-ins for the host platform ─────────────────────────

struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::PasscodeCapture => {
                eprintln!("No passcode stored. Run: housecontrol passcode set");
            }
        }
    }
}

struct TerminalNotifier {
    color: bool,
}

impl Notifier for TerminalNotifier {
    fn alert(&self, title: &str, message: &str) {
        if self.color {
            eprintln!("{} {message}", format!("{title}:").red().bold());
        } else {
            eprintln!("{title}: {message}");
        }
    }
}

// ── Stdin protocol ───────────────────────────────────────────────────

/// One line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Lifecycle(AppLifecycleState),
    QuickAction(QuickAction),
    Button(Command),
    Panic,
    Quit,
}

impl Input {
    /// `None` for blank lines.
    pub fn parse(line: &str) -> Option<Result<Self, String>> {
        let word = line.trim();
        if word.is_empty() {
            return None;
        }
        if let Ok(state) = AppLifecycleState::from_str(word) {
            return Some(Ok(Self::Lifecycle(state)));
        }
        let lower = word.to_ascii_lowercase();
        let input = match lower.as_str() {
            "panic" => Self::Panic,
            "quit" | "exit" => Self::Quit,
            "off" => Self::Button(Command::AlarmOff),
            "away" => Self::Button(Command::AlarmAway),
            "stay" => Self::Button(Command::AlarmStay),
            "toggle" => Self::Button(Command::GarageToggle),
            "leave" | "arrive" => Self::QuickAction(QuickAction::new(shortcut_type(&lower))),
            _ if word.contains('.') => Self::QuickAction(QuickAction::new(word)),
            _ => return Some(Err(format!("unrecognized input '{word}'"))),
        };
        Some(Ok(input))
    }
}

struct Controls {
    handle: KeypadHandle,
    lifecycle: watch::Sender<AppLifecycleState>,
    quick_actions: mpsc::UnboundedSender<QuickAction>,
}

impl Controls {
    fn apply(&self, input: Input) {
        debug!(?input, "operator input");
        match input {
            Input::Lifecycle(state) => {
                // send_replace never fails, even once the keypad is gone
                self.lifecycle.send_replace(state);
            }
            Input::QuickAction(action) => {
                let _ = self.quick_actions.send(action);
            }
            Input::Button(command) => {
                self.handle.send(command);
            }
            Input::Panic => {
                self.handle.panic();
            }
            Input::Quit => self.handle.unmount(),
        }
    }
}

// ── Output ───────────────────────────────────────────────────────────

fn render_action(action: &Action, format: OutputFormat, color: bool) -> Result<String, CliError> {
    let now = Utc::now();
    let mut value = serde_json::to_value(action)?;
    match format {
        OutputFormat::Json | OutputFormat::JsonCompact => {
            if let Value::Object(ref mut map) = value {
                map.insert(
                    "at".into(),
                    Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
            }
            Ok(output::render_json(&value, true))
        }
        OutputFormat::Text => {
            let kind = value
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("action")
                .to_owned();
            let payload = value.get("payload").map(ToString::to_string).unwrap_or_default();
            let time = now.format("%H:%M:%S").to_string();
            let line = if color {
                let kind = if matches!(action, Action::AlarmError(_)) {
                    kind.red().to_string()
                } else {
                    kind.green().to_string()
                };
                format!("{} {kind} {payload}", time.dimmed())
            } else {
                format!("{time} {kind} {payload}")
            };
            Ok(line.trim_end().to_owned())
        }
    }
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    keypad_config: KeypadConfig,
    args: WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let initial = AppLifecycleState::from_str(&args.initial_state).map_err(|_| {
        CliError::Validation {
            field: "initial-state".into(),
            reason: format!(
                "expected active, inactive or background, got '{}'",
                args.initial_state
            ),
        }
    })?;
    let color = output::should_color(global.color);

    let (dispatch_tx, mut actions) = mpsc::unbounded_channel::<Action>();
    let (lifecycle_tx, lifecycle_rx) = watch::channel(initial);
    let (quick_tx, quick_rx) = mpsc::unbounded_channel();

    let keypad = Keypad::new(
        keypad_config,
        Arc::new(dispatch_tx),
        Arc::new(TerminalNavigator),
        Arc::new(TerminalNotifier { color }),
        Arc::new(KeyringCredentialStore::new()),
    )?;
    let controls = Controls {
        handle: keypad.handle(),
        lifecycle: lifecycle_tx,
        quick_actions: quick_tx,
    };

    let signals = PlatformSignals {
        lifecycle: lifecycle_rx,
        quick_actions: quick_rx,
        initial_action: args
            .launch_shortcut
            .as_deref()
            .map(|kind| QuickAction::new(shortcut_type(kind))),
    };
    let mut run = tokio::spawn(async move { keypad.run(signals, None).await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut interrupted = false;

    let phase = loop {
        tokio::select! {
            joined = &mut run => {
                break joined.map_err(|e| CliError::Internal {
                    message: format!("keypad task failed: {e}"),
                })?;
            }
            Some(action) = actions.recv() => {
                output::print_output(&render_action(&action, global.output, color)?);
            }
            signal = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                if let Err(e) = signal {
                    warn!(error = %e, "could not listen for Ctrl-C");
                } else {
                    info!("interrupted, unmounting keypad");
                    controls.handle.unmount();
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match Input::parse(&line) {
                    Some(Ok(input)) => controls.apply(input),
                    Some(Err(message)) => eprintln!("{message}"),
                    None => {}
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin read failed, ignoring further input");
                    stdin_open = false;
                }
            },
        }
    };

    while let Ok(action) = actions.try_recv() {
        output::print_output(&render_action(&action, global.output, color)?);
    }

    match phase {
        StartupPhase::PasscodeRequired => Err(CliError::NoPasscode),
        StartupPhase::Bootstrapping | StartupPhase::SteadyState => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use housecontrol_core::{ARRIVE, LEAVE};
    use serde_json::json;

    use super::*;

    fn parsed(line: &str) -> Input {
        Input::parse(line).expect("not blank").expect("valid")
    }

    #[test]
    fn parses_operator_lines() {
        assert_eq!(parsed("background"), Input::Lifecycle(AppLifecycleState::Background));
        assert_eq!(parsed(" Active "), Input::Lifecycle(AppLifecycleState::Active));
        assert_eq!(parsed("leave"), Input::QuickAction(QuickAction::new(LEAVE)));
        assert_eq!(parsed(ARRIVE), Input::QuickAction(QuickAction::new(ARRIVE)));
        assert_eq!(parsed("toggle"), Input::Button(Command::GarageToggle));
        assert_eq!(parsed("PANIC"), Input::Panic);
        assert_eq!(parsed("quit"), Input::Quit);
        assert!(Input::parse("   ").is_none());
        assert!(matches!(Input::parse("dance"), Some(Err(_))));
    }

    #[test]
    fn json_lines_carry_a_timestamp() {
        let line = render_action(
            &Action::AlarmUpdated(json!({ "ready": true })),
            OutputFormat::Json,
            false,
        )
        .expect("render");
        let value: Value = serde_json::from_str(&line).expect("json");

        assert_eq!(value["type"], "alarm_updated");
        assert_eq!(value["payload"], json!({ "ready": true }));
        assert!(value["at"].as_str().is_some_and(|at| at.ends_with('Z')));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn text_lines_name_the_action() {
        let line = render_action(&Action::AlarmConnected, OutputFormat::Text, false)
            .expect("render");
        assert!(line.ends_with(" alarm_connected"), "{line}");
    }

    #[test]
    fn restored_passcode_is_never_printed() {
        let action = Action::SetPasscode("8642".into());
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::JsonCompact] {
            let line = render_action(&action, format, false).expect("render");
            assert!(!line.contains("8642"), "{line}");
            assert!(line.contains("set_passcode"), "{line}");
        }
    }
}
