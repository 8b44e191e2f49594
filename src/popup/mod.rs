//! Process contract between the hook and the popup helper.
//!
//! The hook launches `<exe> popup` with
//! `--title --message --identifier --timeout-seconds [--interaction-lock-file]`
//! followed by repeated `--choice-label`/`--choice-cmd` pairs, then exits
//! without waiting. The helper shows the surface and runs at most one choice
//! command.

pub mod machine;
pub mod runtime;
pub mod surface;

use crate::choice::{Choice, Intent};
use crate::config::parse_timeout;
use crate::error::NotifyError;
use crate::lock::InteractionLock;
use crate::osascript::lookup_cmd;
use clap::Args;
use machine::Outcome;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use surface::{AppleScriptSurface, PopupView, SurfaceCache, ViewChoice};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Args)]
pub struct PopupArgs {
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub title: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub message: String,

    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub identifier: String,

    #[arg(long = "timeout-seconds", allow_hyphen_values = true)]
    pub timeout_seconds: Option<String>,

    #[arg(long = "interaction-lock-file")]
    pub interaction_lock_file: Option<PathBuf>,

    #[arg(long = "choice-label", allow_hyphen_values = true)]
    pub choice_label: Vec<String>,

    #[arg(long = "choice-cmd", allow_hyphen_values = true)]
    pub choice_cmd: Vec<String>,
}

/// Launch-side description of one popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRequest {
    pub title: String,
    pub message: String,
    pub identifier: String,
    pub timeout_seconds: u64,
    pub lock_file: Option<PathBuf>,
    pub choices: Vec<(String, String)>,
}

impl PopupRequest {
    pub fn new(title: &str, message: &str, identifier: &str, timeout_seconds: u64) -> Self {
        Self {
            title: title.to_string(),
            message: message.to_string(),
            identifier: identifier.to_string(),
            timeout_seconds,
            lock_file: None,
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: &[Choice]) -> Self {
        self.choices = choices
            .iter()
            .map(|c| (c.label.clone(), c.command.clone()))
            .collect();
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--title".to_string(),
            self.title.clone(),
            "--message".to_string(),
            self.message.clone(),
            "--identifier".to_string(),
            self.identifier.clone(),
            "--timeout-seconds".to_string(),
            self.timeout_seconds.to_string(),
        ];
        if let Some(lock) = &self.lock_file {
            args.push("--interaction-lock-file".to_string());
            args.push(lock.display().to_string());
        }
        for (label, command) in &self.choices {
            args.push("--choice-label".to_string());
            args.push(label.clone());
            args.push("--choice-cmd".to_string());
            args.push(command.clone());
        }
        args
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecChoice {
    pub label: String,
    pub command: String,
    pub intent: Intent,
}

/// Helper-side view of the arguments after validation.
#[derive(Debug, Clone)]
pub struct PopupSpec {
    pub title: String,
    pub message: String,
    pub identifier: String,
    pub timeout: Duration,
    pub lock_file: Option<PathBuf>,
    pub choices: Vec<SpecChoice>,
}

impl PopupSpec {
    pub fn from_args(args: &PopupArgs) -> Self {
        let mut choices: Vec<SpecChoice> = args
            .choice_label
            .iter()
            .zip(args.choice_cmd.iter())
            .filter_map(|(label, command)| {
                let label = label.trim();
                if label.is_empty() {
                    return None;
                }
                let command = command.trim().to_string();
                Some(SpecChoice {
                    label: label.to_string(),
                    intent: Intent::infer_from_command(&command),
                    command,
                })
            })
            .collect();
        if choices.is_empty() {
            choices = ["Open", "Approve", "Reject"]
                .iter()
                .map(|label| SpecChoice {
                    label: label.to_string(),
                    command: String::new(),
                    intent: Intent::Neutral,
                })
                .collect();
        }

        Self {
            title: args.title.clone(),
            message: args.message.clone(),
            identifier: args.identifier.clone(),
            timeout: Duration::from_secs(parse_timeout(args.timeout_seconds.as_deref())),
            lock_file: args.interaction_lock_file.clone(),
            choices,
        }
    }

    pub fn view(&self) -> PopupView {
        PopupView {
            title: self.title.clone(),
            message: self.message.clone(),
            choices: self
                .choices
                .iter()
                .map(|c| ViewChoice {
                    label: c.label.clone(),
                    intent: c.intent,
                })
                .collect(),
            timeout: self.timeout,
        }
    }
}

pub trait PopupLauncher {
    /// Starts a helper for `request` and returns without waiting for it.
    fn launch(&self, request: &PopupRequest) -> Result<(), NotifyError>;
}

/// Launches this executable's hidden `popup` subcommand as a detached process.
#[derive(Debug, Clone)]
pub struct HelperLauncher {
    executable: PathBuf,
    cache: SurfaceCache,
}

impl HelperLauncher {
    pub fn new(executable: PathBuf, cache_dir: PathBuf) -> Self {
        Self {
            executable,
            cache: SurfaceCache::new(cache_dir),
        }
    }
}

/// Checks the popup can be rendered here and returns the prepared surface.
pub fn prepare_surface(cache: &SurfaceCache) -> Result<PathBuf, NotifyError> {
    if !cfg!(target_os = "macos") {
        return Err(NotifyError::HelperUnavailable(
            "popup surface requires macOS".to_string(),
        ));
    }
    if lookup_cmd("osascript").is_none() {
        return Err(NotifyError::HelperUnavailable("osascript not found".to_string()));
    }
    cache.prepare(lookup_cmd("osacompile").as_deref())
}

impl PopupLauncher for HelperLauncher {
    fn launch(&self, request: &PopupRequest) -> Result<(), NotifyError> {
        prepare_surface(&self.cache)?;
        spawn_detached(&self.executable, request)
            .map_err(|err| NotifyError::HelperUnavailable(format!("start popup helper: {err}")))?;
        info!(identifier = %request.identifier, choices = request.choices.len(), "popup helper launched");
        Ok(())
    }
}

fn spawn_detached(executable: &Path, request: &PopupRequest) -> std::io::Result<()> {
    let mut cmd = Command::new(executable);
    cmd.arg("popup").args(request.to_args());
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }
    cmd.spawn()?;
    Ok(())
}

/// Entry point of `codex-notify popup ...`.
pub fn run_helper(args: &PopupArgs) -> Result<Outcome, NotifyError> {
    let spec = PopupSpec::from_args(args);
    let lock = spec.lock_file.as_deref().and_then(|path| {
        InteractionLock::acquire(path)
            .map_err(|err| warn!(path = %path.display(), %err, "could not create interaction lock"))
            .ok()
    });

    if let Some(lock) = &lock {
        debug!(path = %lock.path().display(), "interaction lock held");
    }

    let cache = SurfaceCache::new(crate::config::cache_dir());
    let script = match prepare_surface(&cache) {
        Ok(script) => script,
        Err(err) => {
            drop(lock);
            return Err(err);
        }
    };

    let mut surface = AppleScriptSurface::new(script);
    let mut runner = runtime::ShellRunner;
    Ok(runtime::run_popup(
        &spec,
        &mut surface,
        &mut runner,
        lock,
        runtime::TICK_INTERVAL,
    ))
}
