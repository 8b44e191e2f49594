use crate::action::Action;
use crate::action::command::action_command;
use crate::config::{APP_NAME, ApprovalUi, Settings};
use crate::payload::NormalizedEvent;

pub const DEFAULT_TITLE: &str = "Codex";
pub const DEFAULT_MESSAGE: &str = "Received a notification event.";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationRequest {
    pub title: String,
    pub message: String,
    pub group: String,
    pub execute_on_click: Option<String>,
    pub primary_label: Option<String>,
}

impl NotificationRequest {
    /// Fills empty title, message and group with defaults.
    pub fn normalized(mut self) -> Self {
        if self.title.trim().is_empty() {
            self.title = DEFAULT_TITLE.to_string();
        }
        if self.message.trim().is_empty() {
            self.message = DEFAULT_MESSAGE.to_string();
        }
        if self.group.trim().is_empty() {
            self.group = APP_NAME.to_string();
        }
        self
    }
}

/// `codex-notify-<kind>[-<thread>]` with both parts sanitised.
pub fn notification_group(kind: &str, thread_id: Option<&str>) -> String {
    let mut kind = sanitize_id(kind);
    if kind.is_empty() {
        kind = "event".to_string();
    }
    match thread_id.map(sanitize_id).filter(|t| !t.is_empty()) {
        Some(thread) => format!("{APP_NAME}-{kind}-{thread}"),
        None => format!("{APP_NAME}-{kind}"),
    }
}

/// Group of the approval popup for a thread; also the interaction lock key.
pub fn approval_group(thread_id: Option<&str>) -> String {
    notification_group("approval-native", thread_id)
}

pub fn sanitize_id(value: &str) -> String {
    let mapped: String = value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    mapped.trim_matches('-').to_string()
}

/// The system notifications a hook event produces when no approval popup is
/// shown for it.
pub fn build_requests(
    event: &NormalizedEvent,
    settings: &Settings,
    executable: &str,
) -> Vec<NotificationRequest> {
    let thread_id = event.thread_id.as_deref();
    let (title, message) = event.render();

    let mut base = NotificationRequest {
        title,
        message,
        group: notification_group(event.event_name(), thread_id),
        execute_on_click: Some(action_command(executable, &Action::Open, thread_id)),
        ..NotificationRequest::default()
    };

    if !(event.is_approval() && settings.approval_actions) {
        return vec![base];
    }

    if settings.approval_ui == ApprovalUi::Multi {
        let approve = NotificationRequest {
            title: "Codex: Approve".to_string(),
            message: "Click to send the approve keys".to_string(),
            group: notification_group("approve", thread_id),
            execute_on_click: Some(action_command(executable, &Action::Approve, thread_id)),
            primary_label: Some("Approve".to_string()),
            ..NotificationRequest::default()
        };
        let reject = NotificationRequest {
            title: "Codex: Reject".to_string(),
            message: "Click to send the reject keys".to_string(),
            group: notification_group("reject", thread_id),
            execute_on_click: Some(action_command(executable, &Action::Reject, thread_id)),
            primary_label: Some("Reject".to_string()),
            ..NotificationRequest::default()
        };
        return vec![base, approve, reject];
    }

    base.execute_on_click = Some(action_command(executable, &Action::Choose, thread_id));
    vec![base]
}
