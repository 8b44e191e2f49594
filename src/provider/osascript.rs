use crate::notification::NotificationRequest;
use crate::osascript::{self, OsascriptError};
use crate::provider::{Provider, ProviderError};

/// Last-resort `display notification`; title and message only.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsascriptProvider;

impl Provider for OsascriptProvider {
    fn name(&self) -> &'static str {
        "osascript"
    }

    fn is_available(&self) -> bool {
        cfg!(target_os = "macos") && osascript::lookup_cmd("osascript").is_some()
    }

    fn send(&self, request: &NotificationRequest) -> Result<(), ProviderError> {
        let script = format!(
            r#"display notification "{}" with title "{}""#,
            osascript::escape(&request.message),
            osascript::escape(&request.title)
        );
        osascript::run(&script).map_err(|err| match err {
            OsascriptError::NotFound => ProviderError::Unsupported,
            other => ProviderError::Failed {
                provider: self.name(),
                message: other.to_string(),
            },
        })?;
        Ok(())
    }
}
