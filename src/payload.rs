//! Normalisation of the JSON payload Codex hands to the `notify` hook.
//!
//! Codex has used kebab-case, snake_case and camelCase spellings for the same
//! fields across releases, so every logical field is looked up through an
//! ordered list of alternative keys where the first non-empty value wins.

use crate::error::NotifyError;
use serde_json::{Map, Value};

pub const PREVIEW_MAX_CHARS: usize = 180;
const ELLIPSIS: &str = "...";

const EVENT_KEYS: &[&str] = &["event", "type"];
const THREAD_KEYS: &[&str] = &["thread-id", "thread_id", "threadId"];
const PREVIEW_KEYS: &[&str] = &[
    "last-assistant-message",
    "last_assistant_message",
    "lastAssistantMessage",
    "message",
    "text",
];
const INPUT_MESSAGE_KEYS: &[&str] = &["input-messages", "input_messages", "inputMessages"];
const OPTION_KEYS: &[&str] = &[
    "approval-options",
    "approval_options",
    "approvalOptions",
    "options",
    "choices",
    "actions",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    TurnComplete,
    ApprovalRequested,
    AgentError,
    Other(String),
    Unspecified,
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "" => Self::Unspecified,
            "agent-turn-complete" => Self::TurnComplete,
            "approval-requested" => Self::ApprovalRequested,
            "agent-error" => Self::AgentError,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::TurnComplete => "agent-turn-complete",
            Self::ApprovalRequested => "approval-requested",
            Self::AgentError => "agent-error",
            Self::Other(name) => name,
            Self::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub thread_id: Option<String>,
    pub preview: String,
    pub options: Vec<String>,
}

impl Default for NormalizedEvent {
    fn default() -> Self {
        Self {
            kind: EventKind::Unspecified,
            thread_id: None,
            preview: String::new(),
            options: Vec::new(),
        }
    }
}

impl NormalizedEvent {
    pub fn event_name(&self) -> &str {
        self.kind.name()
    }

    pub fn is_approval(&self) -> bool {
        self.kind == EventKind::ApprovalRequested
    }

    /// Title and body shown to the user for this event.
    pub fn render(&self) -> (String, String) {
        let preview = self.preview.clone();
        let or = |fallback: &str| {
            if preview.is_empty() {
                fallback.to_string()
            } else {
                preview.clone()
            }
        };
        match &self.kind {
            EventKind::TurnComplete => ("Codex: Turn Complete".to_string(), or("Waiting for input.")),
            EventKind::ApprovalRequested => (
                "Codex: Approval Requested".to_string(),
                or("Approval requested."),
            ),
            EventKind::AgentError => ("Codex: Error".to_string(), or("Received an error event.")),
            EventKind::Unspecified => (
                "Codex".to_string(),
                or("Received a notification event."),
            ),
            EventKind::Other(name) => {
                let message = if preview.is_empty() {
                    format!("Event: {name}")
                } else {
                    format!("{name}: {preview}")
                };
                ("Codex".to_string(), message)
            }
        }
    }
}

pub fn interpret(raw: &str) -> Result<NormalizedEvent, NotifyError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(NormalizedEvent::default());
    }
    let value: Value = serde_json::from_str(raw).map_err(NotifyError::MalformedPayload)?;
    match value {
        Value::Object(map) => Ok(interpret_map(&map)),
        Value::Null => Ok(NormalizedEvent::default()),
        _ => Err(NotifyError::PayloadNotObject),
    }
}

fn interpret_map(payload: &Map<String, Value>) -> NormalizedEvent {
    let event = first_string(payload, EVENT_KEYS).unwrap_or_default();
    let thread_id = first_string(payload, THREAD_KEYS);

    let message = first_string(payload, PREVIEW_KEYS)
        .or_else(|| first_list(payload, INPUT_MESSAGE_KEYS).map(|msgs| msgs.join(" ")))
        .unwrap_or_default();

    NormalizedEvent {
        kind: EventKind::from_name(&event),
        thread_id,
        preview: preview_text(&message),
        options: first_list(payload, OPTION_KEYS).unwrap_or_default(),
    }
}

fn first_string(payload: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_list(payload: &Map<String, Value>, keys: &[&str]) -> Option<Vec<String>> {
    keys.iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_array))
        .map(|items| items.iter().filter_map(list_item).collect::<Vec<_>>())
        .find(|items| !items.is_empty())
}

fn list_item(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Collapses whitespace and truncates to [`PREVIEW_MAX_CHARS`] characters,
/// ellipsis included.
pub fn preview_text(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= PREVIEW_MAX_CHARS {
        return collapsed;
    }
    let keep = PREVIEW_MAX_CHARS - ELLIPSIS.len();
    let mut truncated: String = collapsed.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_unspecified_event() {
        let event = interpret("   ").unwrap();
        assert_eq!(event.event_name(), "");
        assert_eq!(event.kind, EventKind::Unspecified);
        assert!(event.options.is_empty());
        let (title, message) = event.render();
        assert_eq!(title, "Codex");
        assert_eq!(message, "Received a notification event.");
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            interpret("{not json"),
            Err(NotifyError::MalformedPayload(_))
        ));
        assert!(matches!(interpret("[1,2]"), Err(NotifyError::PayloadNotObject)));
        assert_eq!(interpret("null").unwrap(), NormalizedEvent::default());
    }

    #[test]
    fn turn_complete_preview() {
        let event = interpret(r#"{"event":"agent-turn-complete","message":"Done."}"#).unwrap();
        assert_eq!(event.kind, EventKind::TurnComplete);
        assert_eq!(event.preview, "Done.");
        assert!(event.options.is_empty());
        assert_eq!(
            event.render(),
            ("Codex: Turn Complete".to_string(), "Done.".to_string())
        );
    }

    #[test]
    fn alternative_key_spellings() {
        let event = interpret(
            r#"{"type":"approval-requested","threadId":"abc","thread_id":"  ","last_assistant_message":"  run   tests\n now "}"#,
        )
        .unwrap();
        assert!(event.is_approval());
        assert_eq!(event.thread_id.as_deref(), Some("abc"));
        assert_eq!(event.preview, "run tests now");
    }

    #[test]
    fn first_non_empty_key_wins() {
        let event = interpret(r#"{"event":"","type":"agent-error","message":"","text":"boom"}"#)
            .unwrap();
        assert_eq!(event.kind, EventKind::AgentError);
        assert_eq!(event.preview, "boom");
    }

    #[test]
    fn input_messages_are_joined_when_no_message() {
        let event = interpret(
            r#"{"type":"agent-turn-complete","input-messages":["fix the", "  build  "]}"#,
        )
        .unwrap();
        assert_eq!(event.preview, "fix the build");
    }

    #[test]
    fn options_accept_mixed_lists_and_skip_empty_ones() {
        let event = interpret(
            r#"{"event":"approval-requested","approval-options":["", null],"options":[1, true, " Later ", null]}"#,
        )
        .unwrap();
        assert_eq!(event.options, vec!["1", "true", "Later"]);
    }

    #[test]
    fn preview_truncates_to_exact_length() {
        let long = "x".repeat(500);
        let preview = preview_text(&long);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
        assert!(preview.ends_with("..."));
        assert_eq!(&preview[..177], &"x".repeat(177));

        let exact = "y".repeat(PREVIEW_MAX_CHARS);
        assert_eq!(preview_text(&exact), exact);
    }

    #[test]
    fn preview_truncation_respects_multibyte_chars() {
        let long = "承認".repeat(200);
        let preview = preview_text(&long);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn unknown_event_renders_name() {
        let event = interpret(r#"{"event":"custom-thing"}"#).unwrap();
        assert_eq!(event.render().1, "Event: custom-thing");
        let event = interpret(r#"{"event":"custom-thing","text":"hi"}"#).unwrap();
        assert_eq!(event.render().1, "custom-thing: hi");
    }
}
