use crate::notification::NotificationRequest;

pub mod macos;
pub mod osascript;
pub mod terminal_notifier;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider not available on this platform")]
    Unsupported,
    #[error("{provider} failed: {message}")]
    Failed {
        provider: &'static str,
        message: String,
    },
}

/// A way of putting a notification on screen.
pub trait Provider {
    fn name(&self) -> &'static str;
    fn is_available(&self) -> bool;
    fn send(&self, request: &NotificationRequest) -> Result<(), ProviderError>;
}

/// Providers in fallback order: the rich notifier first, the plain OS
/// notification paths after it.
pub fn default_chain() -> Vec<Box<dyn Provider>> {
    vec![
        Box::new(terminal_notifier::TerminalNotifierProvider::detect()),
        Box::new(macos::MacosProvider::new()),
        Box::new(osascript::OsascriptProvider),
    ]
}
