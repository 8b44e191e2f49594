mod action;
mod choice;
mod cli;
mod codex_config;
mod config;
mod doctor;
mod error;
mod lock;
mod logging;
mod notification;
mod osascript;
mod payload;
mod popup;
mod presenter;
mod provider;

use crate::action::automation::OsascriptAutomation;
use crate::action::command::current_executable;
use crate::action::{Action, Dispatcher};
use crate::cli::{
    ActionArgs, Cli, Commands, DoctorArgs, HookArgs, InitArgs, TestArgs, UninstallArgs,
};
use crate::codex_config::{InitOutcome, UninstallOutcome};
use crate::config::{
    Config, Settings, cache_dir, default_config_path, load_settings, lock_dir, write_file_atomic,
};
use crate::error::NotifyError;
use crate::lock::LockStore;
use crate::logging::LogTarget;
use crate::notification::NotificationRequest;
use crate::popup::HelperLauncher;
use crate::presenter::{Presentation, Presenter};
use clap::Parser;
use std::io::Read;
use std::path::PathBuf;
use tracing::{debug, error};

const TEST_MESSAGE: &str = "codex-notify test notification";

fn main() {
    if let Err(err) = run() {
        error!(%err, "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), NotifyError> {
    let cli = Cli::parse();

    logging::init(match cli.command {
        Commands::Popup(_) => LogTarget::HelperFile,
        _ => LogTarget::Stderr,
    });

    let settings_path = cli.settings.clone();

    match cli.command {
        Commands::Init(args) => handle_init(settings_path.as_ref(), args),
        Commands::Doctor(args) => handle_doctor(settings_path.as_ref(), args),
        Commands::Test(args) => handle_test(settings_path.as_ref(), args),
        Commands::Hook(args) => handle_hook(settings_path.as_ref(), args),
        Commands::Action(args) => handle_action(settings_path.as_ref(), args),
        Commands::Uninstall(args) => handle_uninstall(args),
        Commands::Popup(args) => {
            let outcome = popup::run_helper(&args)?;
            debug!(?outcome, "popup helper finished");
            Ok(())
        }
    }
}

fn handle_init(settings_path: Option<&PathBuf>, args: InitArgs) -> Result<(), NotifyError> {
    let path = resolve_codex_config(args.config)?;
    match codex_config::init(&path, &current_executable(), args.replace)? {
        InitOutcome::Created => println!("Created {} with codex-notify hook", path.display()),
        InitOutcome::AlreadyConfigured => {
            println!("codex-notify is already configured in {}", path.display())
        }
        InitOutcome::Updated { backup } => {
            println!("Updated {}", path.display());
            println!("Backup: {}", backup.display());
        }
    }

    let settings_file = settings_path.cloned().unwrap_or_else(default_config_path);
    if !settings_file.exists() {
        write_file_atomic(&settings_file, Config::template().as_bytes())?;
        println!("Wrote settings template to {}", settings_file.display());
    }
    Ok(())
}

fn handle_uninstall(args: UninstallArgs) -> Result<(), NotifyError> {
    let path = resolve_codex_config(args.config)?;
    match codex_config::uninstall(&path, &current_executable(), !args.no_restore)? {
        UninstallOutcome::Restored { backup } => {
            println!("Restored {} from {}", path.display(), backup.display())
        }
        UninstallOutcome::Removed { backup } => {
            println!("Removed codex-notify hook from {}", path.display());
            println!("Backup: {}", backup.display());
        }
        UninstallOutcome::NotConfigured => {
            println!("codex-notify hook is not configured in {}", path.display())
        }
    }
    Ok(())
}

fn handle_doctor(settings_path: Option<&PathBuf>, args: DoctorArgs) -> Result<(), NotifyError> {
    let settings = load_settings(settings_path)?;
    let codex_path = resolve_codex_config(args.config)?;
    let codex_state = codex_config::inspect(&codex_path, &current_executable())?;

    let checks = doctor::diagnose(&doctor::Environment {
        os: std::env::consts::OS,
        settings: &settings,
        codex_config: &codex_path,
        codex_state,
        lookup: &osascript::lookup_cmd,
    });

    println!("codex-notify doctor");
    println!("-------------------");
    for check in &checks {
        println!("{check}");
    }

    let issues = doctor::issue_count(&checks);
    if issues > 0 {
        return Err(NotifyError::DoctorFailed(issues));
    }
    println!("All checks passed.");
    Ok(())
}

fn handle_test(settings_path: Option<&PathBuf>, args: TestArgs) -> Result<(), NotifyError> {
    let settings = load_settings(settings_path)?;
    let message = if args.message.is_empty() {
        TEST_MESSAGE.to_string()
    } else {
        args.message.join(" ")
    };
    let executable = current_executable();
    let request = NotificationRequest {
        title: "Codex Notify".to_string(),
        message,
        group: "codex-notify-test".to_string(),
        execute_on_click: Some(action::command::action_command(
            &executable,
            &Action::Open,
            None,
        )),
        primary_label: Some("Open".to_string()),
        ..NotificationRequest::default()
    };

    let launcher = HelperLauncher::new(PathBuf::from(&executable), cache_dir());
    presenter(&settings, &launcher, executable).send(&request)
}

fn handle_hook(settings_path: Option<&PathBuf>, args: HookArgs) -> Result<(), NotifyError> {
    let settings = load_settings(settings_path)?;
    let raw = match args.payload {
        Some(raw) => raw,
        None => read_stdin_payload()?,
    };
    let event = payload::interpret(&raw)?;
    let executable = current_executable();
    let choices = choice::resolve(&event, &settings, &executable);

    let launcher = HelperLauncher::new(PathBuf::from(&executable), cache_dir());
    let outcome = presenter(&settings, &launcher, executable).present(&event, &choices)?;
    match outcome {
        Presentation::Suppressed => debug!("notification suppressed by open popup"),
        Presentation::Popup => debug!("approval popup launched"),
        Presentation::Notified(count) => debug!(count, "notifications delivered"),
    }
    Ok(())
}

fn handle_action(settings_path: Option<&PathBuf>, args: ActionArgs) -> Result<(), NotifyError> {
    let settings = load_settings(settings_path)?;
    let action = Action::from_cli(&args.kind, args.text.as_deref())?;
    let thread_id = args.thread_id.as_deref().map(str::trim).filter(|t| !t.is_empty());
    Dispatcher::new(OsascriptAutomation, &settings).dispatch(&action, thread_id)
}

fn presenter<'a>(
    settings: &'a Settings,
    launcher: &'a HelperLauncher,
    executable: String,
) -> Presenter<'a> {
    Presenter::new(
        settings,
        launcher,
        provider::default_chain(),
        LockStore::new(lock_dir()),
        executable,
    )
}

fn resolve_codex_config(path: Option<PathBuf>) -> Result<PathBuf, NotifyError> {
    match path {
        Some(path) => Ok(path),
        None => codex_config::default_codex_config_path(),
    }
}

fn read_stdin_payload() -> Result<String, NotifyError> {
    if stdin_is_tty() {
        return Ok(String::new());
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim().to_string())
}

fn stdin_is_tty() -> bool {
    #[cfg(unix)]
    unsafe {
        return libc::isatty(libc::STDIN_FILENO) == 1;
    }
    #[cfg(not(unix))]
    {
        false
    }
}
