//! Clap derive structures for the `housecontrol` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// housecontrol -- keypad for the house alarm and garage door
#[derive(Debug, Parser)]
#[command(
    name = "housecontrol",
    version,
    about = "Arm, disarm and watch the house alarm from the command line",
    long_about = "Talks to a house control server over HTTP.\n\n\
        One-shot commands arm or disarm the alarm and toggle the garage door;\n\
        `watch` mounts a live keypad fed by the server's event stream.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// House server URL (overrides the config file)
    #[arg(long, short = 's', global = true)]
    pub server: Option<String>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Output format
    #[arg(long, short = 'o', default_value = "text", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color when stdout is a terminal and NO_COLOR is unset
    Auto,
    Always,
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current alarm and garage-door status
    #[command(alias = "st")]
    Status,

    /// Change the alarm mode
    Alarm(AlarmArgs),

    /// Operate the garage door
    Garage(GarageArgs),

    /// Run a home-screen shortcut (leave, arrive, or a full type id)
    Shortcut(ShortcutArgs),

    /// Manage the stored keypad passcode
    Passcode(PasscodeArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),

    /// Mount a live keypad and print every state update as JSON
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct AlarmArgs {
    #[command(subcommand)]
    pub command: AlarmCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmCommand {
    /// Disarm
    Off,
    /// Arm with nobody home
    Away,
    /// Arm with people inside
    Stay,
    /// Sound the panic alarm
    Panic,
}

#[derive(Debug, Args)]
pub struct GarageArgs {
    #[command(subcommand)]
    pub command: GarageCommand,
}

#[derive(Debug, Subcommand)]
pub enum GarageCommand {
    /// Open a closed door or close an open one
    Toggle,
}

#[derive(Debug, Args)]
pub struct ShortcutArgs {
    /// `leave`, `arrive`, or a quick-action type identifier
    pub kind: String,
}

#[derive(Debug, Args)]
pub struct PasscodeArgs {
    #[command(subcommand)]
    pub command: PasscodeCommand,
}

#[derive(Debug, Subcommand)]
pub enum PasscodeCommand {
    /// Store a passcode in the system keyring
    Set {
        /// Read the passcode from stdin instead of prompting
        #[arg(long)]
        stdin: bool,
    },
    /// Remove the stored passcode
    Clear,
    /// Report whether a passcode is stored
    Status,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Interactive configuration wizard
    Init,
    /// Print the config file location
    Path,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Foreground state to start in
    #[arg(long, default_value = "active")]
    pub initial_state: String,

    /// Quick action the keypad was launched with
    #[arg(long)]
    pub launch_shortcut: Option<String>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
