use crate::provider::ProviderError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("parse payload json: {0}")]
    MalformedPayload(#[source] serde_json::Error),
    #[error("payload must be a JSON object")]
    PayloadNotObject,
    #[error("no notifier available (terminal-notifier and osascript not found)")]
    NoCapabilityAvailable,
    #[error("popup helper unavailable: {0}")]
    HelperUnavailable(String),
    #[error("activate app failed: {0}")]
    ActivationFailed(String),
    #[error("send key: {0}")]
    KeySendFailed(String),
    #[error("choose action failed: {0}")]
    ChooserFailed(String),
    #[error("submit action requires --text")]
    MissingText,
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("settings parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("config edit error: {0}")]
    ConfigEdit(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error("existing notify config found in {0}; rerun with --replace to update it")]
    NotifyExists(PathBuf),
    #[error("no backup found for {0}; cannot restore")]
    NoBackup(PathBuf),
    #[error("doctor found {0} issue(s)")]
    DoctorFailed(usize),
    #[error("HOME is not set")]
    MissingHome,
}
