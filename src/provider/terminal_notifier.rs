use crate::notification::NotificationRequest;
use crate::osascript::lookup_cmd;
use crate::provider::{Provider, ProviderError};
use std::path::PathBuf;
use std::process::Command;

/// `terminal-notifier`, which supports grouping and a click command.
#[derive(Debug, Clone, Default)]
pub struct TerminalNotifierProvider {
    path: Option<PathBuf>,
}

impl TerminalNotifierProvider {
    pub fn detect() -> Self {
        Self {
            path: lookup_cmd("terminal-notifier"),
        }
    }
}

pub fn notifier_args(request: &NotificationRequest) -> Vec<String> {
    let mut args = vec![
        "-title".to_string(),
        request.title.clone(),
        "-message".to_string(),
        request.message.clone(),
        "-group".to_string(),
        request.group.clone(),
    ];
    if let Some(cmd) = request.execute_on_click.as_deref().filter(|c| !c.is_empty()) {
        args.push("-execute".to_string());
        args.push(cmd.to_string());
    }
    args
}

impl Provider for TerminalNotifierProvider {
    fn name(&self) -> &'static str {
        "terminal-notifier"
    }

    fn is_available(&self) -> bool {
        self.path.is_some()
    }

    fn send(&self, request: &NotificationRequest) -> Result<(), ProviderError> {
        let path = self.path.as_ref().ok_or(ProviderError::Unsupported)?;
        let status = Command::new(path)
            .args(notifier_args(request))
            .status()
            .map_err(|err| ProviderError::Failed {
                provider: self.name(),
                message: err.to_string(),
            })?;
        if !status.success() {
            return Err(ProviderError::Failed {
                provider: self.name(),
                message: status.to_string(),
            });
        }
        Ok(())
    }
}
