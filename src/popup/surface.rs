//! Rendering side of the popup helper.
//!
//! The helper's logic talks to a [`Surface`]; the production surface is an
//! AppleScript program embedded in the binary and compiled into the cache
//! directory once per content version.

use crate::choice::Intent;
use crate::config::write_file_atomic;
use crate::error::NotifyError;
use crossbeam_channel::Sender;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// A dialog holds at most this many buttons; one of them is the dismiss
/// button, so views with more choices use the list chooser.
pub const MAX_DIALOG_BUTTONS: usize = 3;

/// List prompts show this many characters of the message before offering
/// the full text.
pub const SUMMARY_CHARS: usize = 90;

const DISMISS_LABEL: &str = "Dismiss";
const FULL_TEXT_LABEL: &str = "Show full text";

const SURFACE_SOURCE: &str = r#"on run argv
	set surfaceMode to item 1 of argv
	set popupTitle to item 2 of argv
	set popupPrompt to item 3 of argv
	set fullMessage to item 4 of argv
	set timeoutSeconds to (item 5 of argv) as integer
	set defaultIndex to (item 6 of argv) as integer
	set dismissLabel to item 7 of argv
	set fullTextLabel to item 8 of argv
	set choiceLabels to {}
	repeat with i from 9 to (count of argv)
		set end of choiceLabels to item i of argv
	end repeat
	if surfaceMode is "list" then
		return my runList(popupTitle, popupPrompt, fullMessage, timeoutSeconds, defaultIndex, dismissLabel, fullTextLabel, choiceLabels)
	end if
	return my runButtons(popupTitle, popupPrompt, timeoutSeconds, defaultIndex, dismissLabel, choiceLabels)
end run

on runButtons(popupTitle, popupPrompt, timeoutSeconds, defaultIndex, dismissLabel, choiceLabels)
	set dialogButtons to choiceLabels & {dismissLabel}
	set dismissIndex to count of dialogButtons
	try
		if defaultIndex > 0 then
			set dialogResult to display dialog popupPrompt with title popupTitle buttons dialogButtons default button defaultIndex cancel button dismissIndex giving up after timeoutSeconds
		else
			set dialogResult to display dialog popupPrompt with title popupTitle buttons dialogButtons cancel button dismissIndex giving up after timeoutSeconds
		end if
	on error number -128
		return "dismiss"
	end try
	if gave up of dialogResult then return "timeout"
	return my choiceResult(button returned of dialogResult, choiceLabels)
end runButtons

on runList(popupTitle, popupPrompt, fullMessage, timeoutSeconds, defaultIndex, dismissLabel, fullTextLabel, choiceLabels)
	set deadline to (current date) + timeoutSeconds
	set listItems to choiceLabels
	if fullTextLabel is not "" then set listItems to choiceLabels & {fullTextLabel}
	repeat
		if defaultIndex > 0 then
			set picked to choose from list listItems with title popupTitle with prompt popupPrompt default items {item defaultIndex of choiceLabels} cancel button name dismissLabel
		else
			set picked to choose from list listItems with title popupTitle with prompt popupPrompt cancel button name dismissLabel
		end if
		if picked is false then return "dismiss"
		set pickedLabel to item 1 of picked
		if fullTextLabel is not "" and my sameLabel(pickedLabel, fullTextLabel) then
			set remaining to deadline - (current date)
			if remaining < 1 then return "timeout"
			set fullResult to display dialog fullMessage with title popupTitle buttons {"Back"} default button 1 giving up after remaining
			if gave up of fullResult then return "timeout"
		else
			return my choiceResult(pickedLabel, choiceLabels)
		end if
	end repeat
end runList

on sameLabel(a, b)
	considering case
		return a is b
	end considering
end sameLabel

on choiceResult(pickedLabel, choiceLabels)
	repeat with i from 1 to (count of choiceLabels)
		if my sameLabel(item i of choiceLabels, pickedLabel) then return "choice:" & i
	end repeat
	return "dismiss"
end choiceResult
"#;

const SOURCE_NAME: &str = "popup_surface.applescript";
const COMPILED_NAME: &str = "popup_surface.scpt";
const HASH_NAME: &str = "popup_surface.sha256";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewChoice {
    pub label: String,
    pub intent: Intent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    /// One dialog row: the choices plus a dismiss button.
    Buttons,
    /// A list of choices with a dismiss button and, for long messages, a
    /// full-text entry.
    List,
}

/// What the surface needs to draw; no pixels, only content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub title: String,
    pub message: String,
    pub choices: Vec<ViewChoice>,
    pub timeout: Duration,
}

impl PopupView {
    pub fn mode(&self) -> SurfaceMode {
        if self.choices.len() < MAX_DIALOG_BUTTONS {
            SurfaceMode::Buttons
        } else {
            SurfaceMode::List
        }
    }

    pub fn default_choice(&self) -> Option<usize> {
        self.choices.iter().position(|c| c.intent == Intent::Primary)
    }

    /// Whether the prompt shows only a summary of the message.
    pub fn needs_full_text(&self) -> bool {
        self.mode() == SurfaceMode::List && self.message.chars().count() > SUMMARY_CHARS
    }

    /// Message text followed by the auto-close countdown caption.
    pub fn prompt(&self) -> String {
        let caption = countdown_caption(self.timeout);
        let body = if self.needs_full_text() {
            let mut summary: String = self.message.chars().take(SUMMARY_CHARS - 3).collect();
            summary.push_str("...");
            summary
        } else {
            self.message.clone()
        };
        if body.trim().is_empty() {
            caption
        } else {
            format!("{body}\n\n{caption}")
        }
    }

    pub fn dismiss_label(&self) -> String {
        self.unused_label(DISMISS_LABEL)
    }

    pub fn full_text_label(&self) -> String {
        self.unused_label(FULL_TEXT_LABEL)
    }

    /// `base`, or `base (n)`, such that no choice label matches it in any
    /// letter case.
    fn unused_label(&self, base: &str) -> String {
        let taken = |candidate: &str| {
            self.choices
                .iter()
                .any(|c| c.label.to_lowercase() == candidate.to_lowercase())
        };
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} ({n})"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }
}

pub fn countdown_caption(timeout: Duration) -> String {
    format!("Closes automatically in {} s.", timeout.as_secs())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Shown,
    Chose(usize),
    Dismissed,
    TimedOut,
    Failed(String),
}

pub trait Surface {
    /// Puts the view on screen. User input is reported on `events`.
    fn open(&mut self, view: &PopupView, events: Sender<SurfaceEvent>) -> Result<(), NotifyError>;

    /// Called on every countdown tick. Surfaces that draw the remaining
    /// time only once, at open, leave this empty.
    fn update_countdown(&mut self, _remaining: Duration, _progress: f64) {}

    /// Takes the view down. Must be safe to call more than once.
    fn close(&mut self);
}

/// Runs the prepared AppleScript through `osascript`.
pub struct AppleScriptSurface {
    script: PathBuf,
    child: Option<Child>,
}

impl AppleScriptSurface {
    pub fn new(script: PathBuf) -> Self {
        Self {
            script,
            child: None,
        }
    }
}

pub fn surface_args(view: &PopupView) -> Vec<String> {
    let mode = match view.mode() {
        SurfaceMode::Buttons => "buttons",
        SurfaceMode::List => "list",
    };
    let full_text_label = if view.needs_full_text() {
        view.full_text_label()
    } else {
        String::new()
    };
    let mut args = vec![
        mode.to_string(),
        view.title.clone(),
        view.prompt(),
        view.message.clone(),
        view.timeout.as_secs().to_string(),
        view.default_choice().map(|i| i + 1).unwrap_or(0).to_string(),
        view.dismiss_label(),
        full_text_label,
    ];
    args.extend(view.choices.iter().map(|c| c.label.clone()));
    args
}

pub fn parse_surface_output(output: &str) -> SurfaceEvent {
    let output = output.trim();
    if let Some(idx) = output.strip_prefix("choice:") {
        return match idx.trim().parse::<usize>() {
            Ok(n) if n >= 1 => SurfaceEvent::Chose(n - 1),
            _ => SurfaceEvent::Failed(format!("bad choice index: {idx}")),
        };
    }
    match output {
        "dismiss" => SurfaceEvent::Dismissed,
        "timeout" => SurfaceEvent::TimedOut,
        "" => SurfaceEvent::Failed("surface exited without a result".to_string()),
        other => SurfaceEvent::Failed(format!("unexpected surface output: {other}")),
    }
}

impl Surface for AppleScriptSurface {
    fn open(&mut self, view: &PopupView, events: Sender<SurfaceEvent>) -> Result<(), NotifyError> {
        let mut child = Command::new("osascript")
            .arg(&self.script)
            .args(surface_args(view))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| NotifyError::HelperUnavailable(format!("start surface: {err}")))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| NotifyError::HelperUnavailable("surface stdout missing".into()))?;
        self.child = Some(child);

        let _ = events.send(SurfaceEvent::Shown);
        std::thread::spawn(move || {
            let mut output = String::new();
            let event = match stdout.read_to_string(&mut output) {
                Ok(_) => parse_surface_output(&output),
                Err(err) => SurfaceEvent::Failed(err.to_string()),
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
    }
}

impl Drop for AppleScriptSurface {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cache directory holding the surface script, compiled once per content
/// version.
#[derive(Debug, Clone)]
pub struct SurfaceCache {
    dir: PathBuf,
}

impl SurfaceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns a runnable script path, writing and compiling it only when
    /// the cached copy is missing or was built from different content.
    pub fn prepare(&self, compiler: Option<&Path>) -> Result<PathBuf, NotifyError> {
        self.prepare_source(SURFACE_SOURCE, compiler)
    }

    fn prepare_source(&self, source: &str, compiler: Option<&Path>) -> Result<PathBuf, NotifyError> {
        let source_path = self.dir.join(SOURCE_NAME);
        let compiled_path = self.dir.join(COMPILED_NAME);
        let hash_path = self.dir.join(HASH_NAME);
        let expected = hash_source(source);

        let current = fs::read_to_string(&hash_path).unwrap_or_default();
        if current.trim() == expected {
            if compiled_path.is_file() {
                return Ok(compiled_path);
            }
            if compiler.is_none() && source_path.is_file() {
                return Ok(source_path);
            }
        }

        info!(dir = %self.dir.display(), "preparing popup surface");
        fs::create_dir_all(&self.dir)?;
        write_file_atomic(&source_path, source.as_bytes())?;
        let _ = fs::remove_file(&compiled_path);

        let runnable = match compiler {
            Some(compiler) => {
                self.compile(compiler, &source_path, &compiled_path)?;
                compiled_path
            }
            None => {
                debug!("osacompile not found; running surface from source");
                source_path
            }
        };
        write_file_atomic(&hash_path, format!("{expected}\n").as_bytes())?;
        Ok(runnable)
    }

    fn compile(&self, compiler: &Path, source: &Path, output: &Path) -> Result<(), NotifyError> {
        let tmp = output.with_extension("scpt.tmp");
        let _ = fs::remove_file(&tmp);
        let result = Command::new(compiler)
            .arg("-o")
            .arg(&tmp)
            .arg(source)
            .output()
            .map_err(|err| NotifyError::HelperUnavailable(format!("run compiler: {err}")))?;
        if !result.status.success() {
            let _ = fs::remove_file(&tmp);
            let mut diag = String::from_utf8_lossy(&result.stdout).to_string();
            diag.push_str(&String::from_utf8_lossy(&result.stderr));
            warn!(status = %result.status, "popup surface compilation failed");
            return Err(NotifyError::HelperUnavailable(format!(
                "compile helper failed: {} ({})",
                result.status,
                diag.trim()
            )));
        }
        fs::rename(&tmp, output)?;
        Ok(())
    }
}

fn hash_source(source: &str) -> String {
    let digest = Sha256::digest(source.as_bytes());
    format!("{digest:x}")
}
