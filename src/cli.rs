use crate::popup::PopupArgs;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "codex-notify",
    version,
    about = "macOS notification bridge for the Codex CLI"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the codex-notify settings file (TOML)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Register codex-notify as the notify hook in Codex's config.toml
    Init(InitArgs),
    /// Check the environment and the Codex config
    Doctor(DoctorArgs),
    /// Send a test notification
    Test(TestArgs),
    /// Hook entrypoint for Codex notify
    Hook(HookArgs),
    /// Bring the terminal forward or answer an approval prompt
    Action(ActionArgs),
    /// Remove the notify hook from Codex's config.toml
    Uninstall(UninstallArgs),
    /// Internal popup helper
    #[command(hide = true)]
    Popup(PopupArgs),
}

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Replace an existing notify command
    #[arg(long)]
    pub replace: bool,

    /// Path to Codex config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Path to Codex config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct TestArgs {
    /// Message body (defaults to a fixed test message)
    #[arg(value_name = "MESSAGE", trailing_var_arg = true, allow_hyphen_values = true)]
    pub message: Vec<String>,
}

#[derive(Debug, Args)]
pub struct HookArgs {
    /// JSON payload (if not provided, read from stdin)
    #[arg(allow_hyphen_values = true)]
    pub payload: Option<String>,
}

#[derive(Debug, Args)]
pub struct ActionArgs {
    /// open, approve, reject, choose or submit
    #[arg(value_name = "KIND")]
    pub kind: String,

    /// Codex thread the action belongs to
    #[arg(long, allow_hyphen_values = true)]
    pub thread_id: Option<String>,

    /// Text to type for `submit`
    #[arg(long, allow_hyphen_values = true)]
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct UninstallArgs {
    /// Remove the notify hook instead of restoring the latest backup
    #[arg(long)]
    pub no_restore: bool,

    /// Path to Codex config.toml
    #[arg(long)]
    pub config: Option<PathBuf>,
}
