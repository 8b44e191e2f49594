use super::keys::KeyToken;
use super::{Action, Automation};
use crate::error::NotifyError;
use crate::osascript::{self, OsascriptError};
use std::time::Duration;

/// Drives the target application through `osascript` and System Events.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsascriptAutomation;

impl Automation for OsascriptAutomation {
    fn activate(&self, bundle_id: &str) -> Result<(), NotifyError> {
        let script = format!(
            r#"tell application id "{}" to activate"#,
            osascript::escape(bundle_id)
        );
        osascript::run(&script)
            .map(|_| ())
            .map_err(|err| NotifyError::ActivationFailed(err.to_string()))
    }

    fn send_key(&self, token: &KeyToken) -> Result<(), NotifyError> {
        let script = match token {
            KeyToken::Code(code) => {
                format!(r#"tell application "System Events" to key code {code}"#)
            }
            KeyToken::Text(text) => format!(
                r#"tell application "System Events" to keystroke "{}""#,
                osascript::escape(text)
            ),
        };
        osascript::run(&script)
            .map(|_| ())
            .map_err(|err| NotifyError::KeySendFailed(err.to_string()))
    }

    fn choose(
        &self,
        thread_id: Option<&str>,
        timeout: Duration,
    ) -> Result<Option<Action>, NotifyError> {
        let output = osascript::run(&chooser_script(thread_id, timeout.as_secs()))
            .map_err(|err: OsascriptError| NotifyError::ChooserFailed(err.to_string()))?;
        parse_chooser_output(&output)
    }
}

fn chooser_script(thread_id: Option<&str>, timeout_secs: u64) -> String {
    let prompt = match thread_id {
        Some(thread) => format!(
            "thread: {}\\nApproval requested. Choose what to send.",
            osascript::escape(thread)
        ),
        None => "Approval requested. Choose what to send.".to_string(),
    };
    format!(
        r#"try
	set dialogResult to display dialog "{prompt}" with title "Codex Notify" buttons {{"Open", "Approve", "Reject"}} default button "Open" giving up after {timeout_secs}
	if gave up of dialogResult then
		return "none"
	end if
	set selectedButton to button returned of dialogResult
	if selectedButton is "Open" then
		return "open"
	else if selectedButton is "Approve" then
		return "approve"
	else
		return "reject"
	end if
on error number -128
	return "none"
end try"#
    )
}

fn parse_chooser_output(output: &str) -> Result<Option<Action>, NotifyError> {
    match output.trim().to_lowercase().as_str() {
        "" | "none" => Ok(None),
        "open" => Ok(Some(Action::Open)),
        "approve" => Ok(Some(Action::Approve)),
        "reject" => Ok(Some(Action::Reject)),
        other => Err(NotifyError::ChooserFailed(format!(
            "unknown choice from dialog: {other}"
        ))),
    }
}
