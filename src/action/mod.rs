//! Key-injection dispatcher for `codex-notify action ...`.

pub mod automation;
pub mod command;
pub mod keys;

use crate::config::Settings;
use crate::error::NotifyError;
use keys::KeyToken;
use std::time::Duration;
use tracing::{debug, info};

const SETTLE_DELAY: Duration = Duration::from_millis(150);
const INTER_KEY_DELAY: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Open,
    Approve,
    Reject,
    Choose,
    Submit(String),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Choose => "choose",
            Self::Submit(_) => "submit",
        }
    }

    /// Builds an action from the CLI kind and optional `--text`.
    pub fn from_cli(kind: &str, text: Option<&str>) -> Result<Self, NotifyError> {
        match kind.trim().to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "choose" => Ok(Self::Choose),
            "submit" => Ok(Self::Submit(text.unwrap_or_default().to_string())),
            other => Err(NotifyError::UnknownAction(other.to_string())),
        }
    }
}

/// OS capabilities the dispatcher drives.
pub trait Automation {
    fn activate(&self, bundle_id: &str) -> Result<(), NotifyError>;
    fn send_key(&self, token: &KeyToken) -> Result<(), NotifyError>;
    /// Shows the Open/Approve/Reject chooser. `Ok(None)` means the user
    /// cancelled or the dialog gave up.
    fn choose(&self, thread_id: Option<&str>, timeout: Duration)
    -> Result<Option<Action>, NotifyError>;
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub struct Dispatcher<A> {
    automation: A,
    bundle_id: String,
    approve_keys: Vec<KeyToken>,
    reject_keys: Vec<KeyToken>,
    chooser_timeout: Duration,
}

impl<A: Automation> Dispatcher<A> {
    pub fn new(automation: A, settings: &Settings) -> Self {
        Self {
            automation,
            bundle_id: settings.terminal_bundle_id.clone(),
            approve_keys: keys::parse_sequence(
                &settings.approve_keys,
                crate::config::DEFAULT_APPROVE_KEYS,
            ),
            reject_keys: keys::parse_sequence(
                &settings.reject_keys,
                crate::config::DEFAULT_REJECT_KEYS,
            ),
            chooser_timeout: settings.approval_timeout(),
        }
    }

    pub fn dispatch(&self, action: &Action, thread_id: Option<&str>) -> Result<(), NotifyError> {
        info!(action = action.kind(), thread_id, "dispatching action");
        match action {
            Action::Open => self.automation.activate(&self.bundle_id),
            Action::Approve => self.send_keys(&self.approve_keys, thread_id),
            Action::Reject => self.send_keys(&self.reject_keys, thread_id),
            Action::Submit(text) => {
                if text.trim().is_empty() {
                    return Err(NotifyError::MissingText);
                }
                self.send_keys(&keys::submit_sequence(text), thread_id)
            }
            Action::Choose => {
                match self.automation.choose(thread_id, self.chooser_timeout)? {
                    None => {
                        debug!("chooser dismissed without a choice");
                        Ok(())
                    }
                    Some(Action::Choose) | Some(Action::Submit(_)) => Ok(()),
                    Some(chosen) => self.dispatch(&chosen, thread_id),
                }
            }
        }
    }

    fn send_keys(&self, seq: &[KeyToken], thread_id: Option<&str>) -> Result<(), NotifyError> {
        self.automation.activate(&self.bundle_id)?;
        self.automation.sleep(SETTLE_DELAY);
        for token in seq {
            self.automation.send_key(token).map_err(|err| match (err, thread_id) {
                (NotifyError::KeySendFailed(msg), Some(thread)) => {
                    NotifyError::KeySendFailed(format!("thread {thread}: {msg}"))
                }
                (err, _) => err,
            })?;
            self.automation.sleep(INTER_KEY_DELAY);
        }
        Ok(())
    }
}
