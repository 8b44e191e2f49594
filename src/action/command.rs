//! Continuation commands: the shell command lines a notification click or a
//! popup button runs to re-enter this binary with an `action` subcommand.

use super::Action;
use crate::config::APP_NAME;

/// Path of the running binary, falling back to the bare program name.
pub fn current_executable() -> String {
    std::env::current_exe()
        .ok()
        .map(|p| p.display().to_string())
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| APP_NAME.to_string())
}

/// Builds `'<exe>' action '<kind>' [--thread-id '<id>'] [--text '<text>']`.
pub fn action_command(executable: &str, action: &Action, thread_id: Option<&str>) -> String {
    let mut parts = vec![
        shell_quote(executable),
        "action".to_string(),
        shell_quote(action.kind()),
    ];
    if let Some(thread_id) = thread_id.filter(|t| !t.is_empty()) {
        parts.push("--thread-id".to_string());
        parts.push(shell_quote(thread_id));
    }
    if let Action::Submit(text) = action {
        parts.push("--text".to_string());
        parts.push(shell_quote(text));
    }
    parts.join(" ")
}

/// POSIX single-quote escaping; the result is always one shell word.
pub fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}
