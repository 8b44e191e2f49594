use crate::codex_config::NotifyState;
use crate::config::{NotificationUi, Settings};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub status: Status,
    pub name: &'static str,
    pub detail: String,
    /// Whether this check adds to the issue count.
    pub counted: bool,
}

impl Check {
    fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            name,
            detail: detail.into(),
            counted: false,
        }
    }

    fn warn(name: &'static str, detail: impl Into<String>, counted: bool) -> Self {
        Self {
            status: Status::Warn,
            name,
            detail: detail.into(),
            counted,
        }
    }

    fn fail(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            name,
            detail: detail.into(),
            counted: true,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.status {
            Status::Ok => "[ OK ]",
            Status::Warn => "[WARN]",
            Status::Fail => "[FAIL]",
        };
        write!(f, "{tag} {}: {}", self.name, self.detail)
    }
}

pub struct Environment<'a> {
    pub os: &'a str,
    pub settings: &'a Settings,
    pub codex_config: &'a Path,
    pub codex_state: NotifyState,
    pub lookup: &'a dyn Fn(&str) -> Option<PathBuf>,
}

pub fn diagnose(env: &Environment<'_>) -> Vec<Check> {
    let mut checks = Vec::new();

    if env.os == "macos" {
        checks.push(Check::ok("OS", "macos"));
    } else {
        checks.push(Check::fail("OS", format!("expected macos, got {}", env.os)));
    }

    checks.push(match (env.lookup)("terminal-notifier") {
        Some(path) => Check::ok("terminal-notifier", path.display().to_string()),
        None => Check::warn(
            "terminal-notifier",
            "not found (will use the native or osascript fallback)",
            false,
        ),
    });

    checks.push(match (env.lookup)("osascript") {
        Some(path) => Check::ok("osascript", path.display().to_string()),
        None => Check::fail("osascript", "not found"),
    });

    if env.settings.notification_ui == NotificationUi::Popup {
        checks.push(match (env.lookup)("osacompile") {
            Some(path) => Check::ok("osacompile", path.display().to_string()),
            None => Check::warn(
                "osacompile",
                "not found (popup surface will run uncompiled)",
                false,
            ),
        });
    }

    let cfg = env.codex_config.display();
    checks.push(match &env.codex_state {
        NotifyState::Ours => Check::ok("config", format!("notify hook is configured ({cfg})")),
        NotifyState::Missing => {
            Check::warn("config", format!("notify hook not configured ({cfg})"), true)
        }
        NotifyState::Other(parts) => Check::warn(
            "config",
            format!("notify points at {:?} ({cfg})", parts.join(" ")),
            true,
        ),
    });

    checks
}

pub fn issue_count(checks: &[Check]) -> usize {
    checks.iter().filter(|c| c.counted).count()
}
