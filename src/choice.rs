//! Maps approval option labels to continuation commands.

use crate::action::Action;
use crate::action::command::action_command;
use crate::config::Settings;
use crate::payload::NormalizedEvent;

/// How a choice should be emphasised by the surface rendering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Primary,
    Destructive,
    Neutral,
}

impl Intent {
    pub fn for_action(action: &Action) -> Self {
        match action {
            Action::Approve => Self::Primary,
            Action::Reject => Self::Destructive,
            _ => Self::Neutral,
        }
    }

    /// Recovers the intent of an already-encoded continuation command.
    pub fn infer_from_command(command: &str) -> Self {
        let cmd = command.to_lowercase();
        if cmd.contains(" action 'approve'") || cmd.contains(" action approve") {
            Self::Primary
        } else if cmd.contains(" action 'reject'") || cmd.contains(" action reject") {
            Self::Destructive
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub command: String,
    pub action: Action,
    pub intent: Intent,
}

impl Choice {
    pub fn new(label: &str, action: Action, executable: &str, thread_id: Option<&str>) -> Self {
        Self {
            label: label.trim().to_string(),
            command: action_command(executable, &action, thread_id),
            intent: Intent::for_action(&action),
            action,
        }
    }
}

pub fn resolve(event: &NormalizedEvent, settings: &Settings, executable: &str) -> Vec<Choice> {
    if !event.is_approval() || !settings.approval_actions {
        return Vec::new();
    }
    let thread_id = event.thread_id.as_deref();
    let choices = choices_from_options(&event.options, executable, thread_id);
    if choices.is_empty() {
        return default_choices(executable, thread_id);
    }
    choices
}

pub fn default_choices(executable: &str, thread_id: Option<&str>) -> Vec<Choice> {
    vec![
        Choice::new("Open", Action::Open, executable, thread_id),
        Choice::new("Approve", Action::Approve, executable, thread_id),
        Choice::new("Reject", Action::Reject, executable, thread_id),
    ]
}

fn choices_from_options(
    options: &[String],
    executable: &str,
    thread_id: Option<&str>,
) -> Vec<Choice> {
    let total = options.len();
    options
        .iter()
        .enumerate()
        .filter(|(_, label)| !label.trim().is_empty())
        .map(|(idx, label)| {
            let action = action_for_option(label, idx, total);
            Choice::new(label, action, executable, thread_id)
        })
        .collect()
}

/// Vocabulary match first, then positional yes/no for binary prompts, then the
/// label itself as typed text.
pub fn action_for_option(label: &str, idx: usize, total: usize) -> Action {
    let norm: String = label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .collect();

    match norm.as_str() {
        "open" | "show" | "focus" => return Action::Open,
        "approve" | "approved" | "allow" | "yes" | "y" | "ok" => return Action::Approve,
        "reject" | "denied" | "deny" | "no" | "n" | "cancel" => return Action::Reject,
        _ => {}
    }

    if total == 2 {
        return if idx == 0 {
            Action::Approve
        } else {
            Action::Reject
        };
    }

    Action::Submit(label.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::interpret;

    const EXE: &str = "/opt/bin/codex-notify";

    fn resolve_json(raw: &str) -> Vec<Choice> {
        resolve(&interpret(raw).unwrap(), &Settings::default(), EXE)
    }

    fn actions(choices: &[Choice]) -> Vec<(String, Action)> {
        choices
            .iter()
            .map(|c| (c.label.clone(), c.action.clone()))
            .collect()
    }

    #[test]
    fn yes_no_options_map_to_approve_reject() {
        let choices =
            resolve_json(r#"{"event":"approval-requested","thread-id":"t1","options":["Yes","No"]}"#);
        assert_eq!(
            actions(&choices),
            vec![
                ("Yes".to_string(), Action::Approve),
                ("No".to_string(), Action::Reject)
            ]
        );
        assert_eq!(
            choices[0].command,
            "'/opt/bin/codex-notify' action 'approve' --thread-id 't1'"
        );
        assert_eq!(choices[0].intent, Intent::Primary);
        assert_eq!(choices[1].intent, Intent::Destructive);
    }

    #[test]
    fn two_unknown_labels_use_position() {
        let choices = resolve_json(
            r#"{"event":"approval-requested","options":["Run it","Skip this"]}"#,
        );
        assert_eq!(choices[0].action, Action::Approve);
        assert_eq!(choices[1].action, Action::Reject);
    }

    #[test]
    fn three_unknown_labels_submit_literal_text() {
        let choices = resolve_json(
            r#"{"event":"approval-requested","options":["Run once","Always run","Stop"]}"#,
        );
        assert_eq!(
            actions(&choices),
            vec![
                ("Run once".to_string(), Action::Submit("Run once".into())),
                ("Always run".to_string(), Action::Submit("Always run".into())),
                ("Stop".to_string(), Action::Submit("Stop".into())),
            ]
        );
        assert_eq!(
            choices[1].command,
            "'/opt/bin/codex-notify' action 'submit' --text 'Always run'"
        );
    }

    #[test]
    fn vocabulary_wins_over_position() {
        assert_eq!(action_for_option("Deny", 0, 2), Action::Reject);
        assert_eq!(action_for_option("ALLOW", 1, 2), Action::Approve);
        assert_eq!(action_for_option("Show_", 1, 3), Action::Open);
        assert_eq!(action_for_option("o-k", 2, 3), Action::Approve);
    }

    #[test]
    fn missing_options_yield_default_triple() {
        let choices = resolve_json(r#"{"event":"approval-requested"}"#);
        assert_eq!(
            actions(&choices),
            vec![
                ("Open".to_string(), Action::Open),
                ("Approve".to_string(), Action::Approve),
                ("Reject".to_string(), Action::Reject),
            ]
        );
    }

    #[test]
    fn non_approval_or_disabled_yields_nothing() {
        assert!(resolve_json(r#"{"event":"agent-turn-complete","message":"Done."}"#).is_empty());

        let settings = Settings {
            approval_actions: false,
            ..Settings::default()
        };
        let event = interpret(r#"{"event":"approval-requested"}"#).unwrap();
        assert!(resolve(&event, &settings, EXE).is_empty());
    }

    #[test]
    fn intent_inferred_from_command() {
        let approve = Choice::new("x", Action::Approve, EXE, None);
        assert_eq!(Intent::infer_from_command(&approve.command), Intent::Primary);
        let reject = Choice::new("x", Action::Reject, EXE, None);
        assert_eq!(Intent::infer_from_command(&reject.command), Intent::Destructive);
        assert_eq!(Intent::infer_from_command(""), Intent::Neutral);
    }
}
