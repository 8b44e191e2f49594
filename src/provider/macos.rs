use crate::notification::NotificationRequest;
use crate::provider::{Provider, ProviderError};

#[cfg(target_os = "macos")]
use mac_notification_sys::Notification as MacNotification;

/// Plain title/message notification through the native notification center.
/// Click actions are not supported here.
#[cfg(target_os = "macos")]
#[derive(Debug, Clone, Default)]
pub struct MacosProvider;

#[cfg(target_os = "macos")]
impl MacosProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(target_os = "macos")]
impl Provider for MacosProvider {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, request: &NotificationRequest) -> Result<(), ProviderError> {
        let mut mac = MacNotification::new();
        mac.title(&request.title).message(&request.message);
        mac.send().map_err(|err| ProviderError::Failed {
            provider: self.name(),
            message: err.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(not(target_os = "macos"))]
#[derive(Debug, Clone, Default)]
pub struct MacosProvider;

#[cfg(not(target_os = "macos"))]
impl MacosProvider {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(not(target_os = "macos"))]
impl Provider for MacosProvider {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn send(&self, _request: &NotificationRequest) -> Result<(), ProviderError> {
        Err(ProviderError::Unsupported)
    }
}
