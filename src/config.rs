use crate::error::NotifyError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "codex-notify";
pub const DEFAULT_TERMINAL_ID: &str = "com.mitchellh.ghostty";
pub const DEFAULT_APPROVE_KEYS: &str = "y,enter";
pub const DEFAULT_REJECT_KEYS: &str = "n,enter";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 45;
pub const MIN_TIMEOUT_SECONDS: u64 = 5;
pub const MAX_TIMEOUT_SECONDS: u64 = 300;

/// On-disk settings file. Every field is optional; unset fields fall back to
/// environment overrides and then to the built-in defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    pub approval_actions: Option<bool>,
    pub popup_approval_actions: Option<bool>,
    pub notification_ui: Option<String>,
    pub approval_ui: Option<String>,
    pub approval_timeout_seconds: Option<TimeoutSetting>,
    pub terminal_bundle_id: Option<String>,
    pub approve_keys: Option<String>,
    pub reject_keys: Option<String>,
}

/// A timeout as written in the settings file: a number, or a string that is
/// parsed the same way as the environment override.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TimeoutSetting {
    Seconds(i64),
    Text(String),
}

impl TimeoutSetting {
    pub fn seconds(&self) -> u64 {
        match self {
            Self::Seconds(value) => clamp_timeout(*value),
            Self::Text(raw) => parse_timeout(Some(raw)),
        }
    }
}

impl Config {
    pub fn template() -> &'static str {
        r#"# codex-notify settings
# approval_actions = true
# popup_approval_actions = true
# notification_ui = "popup"        # popup | system
# approval_ui = "popup"            # popup | single | multi
# approval_timeout_seconds = 45    # clamped to 5..=300
# terminal_bundle_id = "com.mitchellh.ghostty"
# approve_keys = "y,enter"
# reject_keys = "n,enter"
"#
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationUi {
    Popup,
    System,
}

impl NotificationUi {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "system" => Self::System,
            _ => Self::Popup,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalUi {
    Popup,
    Multi,
}

impl ApprovalUi {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "multi" => Self::Multi,
            // "single" is the legacy spelling of the popup flow
            _ => Self::Popup,
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub approval_actions: bool,
    pub popup_approval_actions: bool,
    pub notification_ui: NotificationUi,
    pub approval_ui: ApprovalUi,
    pub approval_timeout_seconds: u64,
    pub terminal_bundle_id: String,
    pub approve_keys: String,
    pub reject_keys: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            approval_actions: true,
            popup_approval_actions: true,
            notification_ui: NotificationUi::Popup,
            approval_ui: ApprovalUi::Popup,
            approval_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            terminal_bundle_id: DEFAULT_TERMINAL_ID.to_string(),
            approve_keys: DEFAULT_APPROVE_KEYS.to_string(),
            reject_keys: DEFAULT_REJECT_KEYS.to_string(),
        }
    }
}

impl Settings {
    /// Layers environment overrides over the settings file over defaults.
    pub fn resolve<F>(config: Option<&Config>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let file = config.cloned().unwrap_or_default();
        let defaults = Self::default();

        let approval_actions = env("CODEX_NOTIFY_ENABLE_APPROVAL_ACTIONS")
            .map(|v| parse_flag(&v))
            .or(file.approval_actions)
            .unwrap_or(defaults.approval_actions);
        let popup_approval_actions = env("CODEX_NOTIFY_ENABLE_POPUP_APPROVAL_ACTIONS")
            .or_else(|| env("CODEX_NOTIFY_ENABLE_NATIVE_APPROVAL_ACTIONS"))
            .map(|v| parse_flag(&v))
            .or(file.popup_approval_actions)
            .unwrap_or(defaults.popup_approval_actions);
        let notification_ui = env("CODEX_NOTIFY_NOTIFICATION_UI")
            .or(file.notification_ui)
            .map(|v| NotificationUi::parse(&v))
            .unwrap_or(defaults.notification_ui);
        let approval_ui = env("CODEX_NOTIFY_APPROVAL_UI")
            .or(file.approval_ui)
            .map(|v| ApprovalUi::parse(&v))
            .unwrap_or(defaults.approval_ui);
        let approval_timeout_seconds = match env("CODEX_NOTIFY_APPROVAL_TIMEOUT_SECONDS") {
            Some(raw) => parse_timeout(Some(&raw)),
            None => file
                .approval_timeout_seconds
                .as_ref()
                .map(TimeoutSetting::seconds)
                .unwrap_or(defaults.approval_timeout_seconds),
        };
        let terminal_bundle_id = env("CODEX_NOTIFY_TERMINAL_BUNDLE_ID")
            .or(file.terminal_bundle_id)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.terminal_bundle_id);
        let approve_keys = env("CODEX_NOTIFY_APPROVE_KEYS")
            .or(file.approve_keys)
            .unwrap_or(defaults.approve_keys);
        let reject_keys = env("CODEX_NOTIFY_REJECT_KEYS")
            .or(file.reject_keys)
            .unwrap_or(defaults.reject_keys);

        Self {
            approval_actions,
            popup_approval_actions,
            notification_ui,
            approval_ui,
            approval_timeout_seconds,
            terminal_bundle_id,
            approve_keys,
            reject_keys,
        }
    }

    pub fn approval_timeout(&self) -> Duration {
        Duration::from_secs(self.approval_timeout_seconds)
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parses a timeout in seconds. Missing or non-numeric input yields the
/// default; numeric input is clamped.
pub fn parse_timeout(raw: Option<&str>) -> u64 {
    match raw.map(str::trim).and_then(|v| v.parse::<i64>().ok()) {
        Some(value) => clamp_timeout(value),
        None => DEFAULT_TIMEOUT_SECONDS,
    }
}

pub fn clamp_timeout(value: i64) -> u64 {
    value.clamp(MIN_TIMEOUT_SECONDS as i64, MAX_TIMEOUT_SECONDS as i64) as u64
}

pub fn load_settings(path: Option<&PathBuf>) -> Result<Settings, NotifyError> {
    let config = load_config(path)?;
    Ok(Settings::resolve(config.as_ref(), |key| std::env::var(key).ok()))
}

pub fn load_config(path: Option<&PathBuf>) -> Result<Option<Config>, NotifyError> {
    let path = path.cloned().unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(&path)?;
    let config: Config = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn default_config_path() -> PathBuf {
    if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join(APP_NAME).join("config.toml");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_NAME)
            .join("config.toml");
    }
    PathBuf::from(format!("{APP_NAME}.toml"))
}

/// Directory for the compiled popup surface and the helper log.
pub fn cache_dir() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".cache")))
        .unwrap_or_else(|_| std::env::temp_dir());
    base.join(APP_NAME)
}

/// Directory for per-group interaction lock markers.
pub fn lock_dir() -> PathBuf {
    std::env::temp_dir().join(APP_NAME).join("locks")
}

pub fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<(), NotifyError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let tmp = dir.join(format!(".{}.tmp-{}", file_name, std::process::id()));
    if let Err(err) = fs::write(&tmp, contents) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    if let Err(err) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
