//! Decides which surface a hook event is shown on.

use crate::choice::{Choice, Intent};
use crate::config::{ApprovalUi, NotificationUi, Settings};
use crate::error::NotifyError;
use crate::lock::LockStore;
use crate::notification::{NotificationRequest, approval_group, build_requests};
use crate::payload::NormalizedEvent;
use crate::popup::{PopupLauncher, PopupRequest};
use crate::provider::{Provider, ProviderError};
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// An approval popup for the same group is already on screen.
    Suppressed,
    /// The approval popup helper was launched.
    Popup,
    /// This many notification requests were delivered.
    Notified(usize),
}

pub struct Presenter<'a> {
    settings: &'a Settings,
    launcher: &'a dyn PopupLauncher,
    providers: Vec<Box<dyn Provider>>,
    locks: LockStore,
    executable: String,
}

impl<'a> Presenter<'a> {
    pub fn new(
        settings: &'a Settings,
        launcher: &'a dyn PopupLauncher,
        providers: Vec<Box<dyn Provider>>,
        locks: LockStore,
        executable: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            launcher,
            providers,
            locks,
            executable: executable.into(),
        }
    }

    pub fn present(
        &self,
        event: &NormalizedEvent,
        choices: &[Choice],
    ) -> Result<Presentation, NotifyError> {
        let thread_id = event.thread_id.as_deref();

        if event.is_approval() {
            let group = approval_group(thread_id);
            if self.locks.is_held(&group, self.lock_max_age()) {
                info!(%group, "approval popup already open; suppressing notification");
                return Ok(Presentation::Suppressed);
            }

            if self.wants_approval_popup() && !choices.is_empty() {
                let (title, message) = event.render();
                let mut request = PopupRequest::new(
                    &title,
                    &message,
                    &group,
                    self.settings.approval_timeout_seconds,
                )
                .with_choices(choices);
                request.lock_file = Some(self.locks.path_for(&group));

                match self.launcher.launch(&request) {
                    Ok(()) => return Ok(Presentation::Popup),
                    Err(err) => warn!(%err, "approval popup unavailable; falling back to notifications"),
                }
            }
        }

        let requests = build_requests(event, self.settings, &self.executable);
        for request in &requests {
            self.send(request)?;
        }
        Ok(Presentation::Notified(requests.len()))
    }

    /// Delivers one request: a single-choice popup in popup mode, otherwise
    /// (or when the popup cannot be shown) the first provider that works.
    pub fn send(&self, request: &NotificationRequest) -> Result<(), NotifyError> {
        let request = request.clone().normalized();

        if self.settings.notification_ui == NotificationUi::Popup {
            let (label, command) = single_choice(&request);
            let popup = PopupRequest {
                choices: vec![(label, command)],
                ..PopupRequest::new(
                    &request.title,
                    &request.message,
                    &request.group,
                    self.settings.approval_timeout_seconds,
                )
            };
            match self.launcher.launch(&popup) {
                Ok(()) => return Ok(()),
                Err(err) => debug!(%err, group = %request.group, "popup unavailable; using providers"),
            }
        }

        let mut last_err: Option<ProviderError> = None;
        for provider in &self.providers {
            if !provider.is_available() {
                continue;
            }
            match provider.send(&request) {
                Ok(()) => {
                    debug!(provider = provider.name(), group = %request.group, "notification sent");
                    return Ok(());
                }
                Err(err) => {
                    warn!(provider = provider.name(), %err, "provider failed");
                    last_err = Some(err);
                }
            }
        }
        match last_err {
            Some(err) => Err(err.into()),
            None => Err(NotifyError::NoCapabilityAvailable),
        }
    }

    fn wants_approval_popup(&self) -> bool {
        self.settings.notification_ui == NotificationUi::Popup
            && self.settings.approval_ui != ApprovalUi::Multi
            && self.settings.popup_approval_actions
    }

    fn lock_max_age(&self) -> Duration {
        self.settings.approval_timeout() * 2
    }
}

/// Label and command of the one button a plain notification gets when it is
/// rendered as a popup.
fn single_choice(request: &NotificationRequest) -> (String, String) {
    let command = request
        .execute_on_click
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    if let Some(label) = request.primary_label.as_deref().map(str::trim) {
        if !label.is_empty() {
            return (label.to_string(), command);
        }
    }
    (label_for_command(&command).to_string(), command)
}

fn label_for_command(command: &str) -> &'static str {
    if command.is_empty() {
        return "Close";
    }
    match Intent::infer_from_command(command) {
        Intent::Primary => return "Approve",
        Intent::Destructive => return "Reject",
        Intent::Neutral => {}
    }
    let cmd = command.to_lowercase();
    if cmd.contains(" action 'choose'") || cmd.contains(" action choose") {
        "Choose"
    } else if cmd.contains(" action 'submit'") || cmd.contains(" action submit") {
        "Submit"
    } else {
        "Open"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::choice::resolve;
    use crate::lock::InteractionLock;
    use crate::payload::interpret;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EXE: &str = "/opt/bin/codex-notify";

    #[derive(Default)]
    struct FakeLauncher {
        unavailable: bool,
        launched: RefCell<Vec<PopupRequest>>,
    }

    impl PopupLauncher for FakeLauncher {
        fn launch(&self, request: &PopupRequest) -> Result<(), NotifyError> {
            if self.unavailable {
                return Err(NotifyError::HelperUnavailable("not on macOS".into()));
            }
            self.launched.borrow_mut().push(request.clone());
            Ok(())
        }
    }

    struct FakeProvider {
        name: &'static str,
        available: bool,
        fails: bool,
        sent: Rc<RefCell<Vec<(&'static str, NotificationRequest)>>>,
    }

    impl Provider for FakeProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn send(&self, request: &NotificationRequest) -> Result<(), ProviderError> {
            if self.fails {
                return Err(ProviderError::Failed {
                    provider: self.name,
                    message: "boom".into(),
                });
            }
            self.sent.borrow_mut().push((self.name, request.clone()));
            Ok(())
        }
    }

    type Sent = Rc<RefCell<Vec<(&'static str, NotificationRequest)>>>;

    fn providers(spec: &[(&'static str, bool, bool)], sent: &Sent) -> Vec<Box<dyn Provider>> {
        spec.iter()
            .map(|&(name, available, fails)| {
                Box::new(FakeProvider {
                    name,
                    available,
                    fails,
                    sent: sent.clone(),
                }) as Box<dyn Provider>
            })
            .collect()
    }

    fn system_ui() -> Settings {
        Settings {
            notification_ui: NotificationUi::System,
            ..Settings::default()
        }
    }

    #[test]
    fn turn_complete_issues_one_plain_notification() {
        let dir = tempfile::tempdir().unwrap();
        let settings = system_ui();
        let launcher = FakeLauncher::default();
        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );

        let event = interpret(r#"{"event":"agent-turn-complete","message":"Done."}"#).unwrap();
        let choices = resolve(&event, &settings, EXE);
        assert!(choices.is_empty());

        let outcome = presenter.present(&event, &choices).unwrap();
        assert_eq!(outcome, Presentation::Notified(1));
        assert!(launcher.launched.borrow().is_empty());
        let sent = sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.title, "Codex: Turn Complete");
        assert_eq!(sent[0].1.message, "Done.");
    }

    #[test]
    fn approval_launches_popup_with_all_choices_and_lock() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let launcher = FakeLauncher::default();
        let sent = Sent::default();
        let store = LockStore::new(dir.path());
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, false)], &sent),
            store.clone(),
            EXE,
        );

        let event = interpret(
            r#"{"event":"approval-requested","thread-id":"t1","options":["Yes","No"]}"#,
        )
        .unwrap();
        let choices = resolve(&event, &settings, EXE);
        assert_eq!(presenter.present(&event, &choices).unwrap(), Presentation::Popup);

        let launched = launcher.launched.borrow();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].identifier, "codex-notify-approval-native-t1");
        assert_eq!(launched[0].timeout_seconds, 45);
        assert_eq!(
            launched[0].lock_file,
            Some(store.path_for("codex-notify-approval-native-t1"))
        );
        let labels: Vec<&str> = launched[0].choices.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["Yes", "No"]);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn held_lock_suppresses_everything() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let launcher = FakeLauncher::default();
        let sent = Sent::default();
        let store = LockStore::new(dir.path());
        let _lock =
            InteractionLock::acquire(&store.path_for("codex-notify-approval-native-t1")).unwrap();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, false)], &sent),
            store,
            EXE,
        );

        let event = interpret(r#"{"event":"approval-requested","thread-id":"t1"}"#).unwrap();
        let choices = resolve(&event, &settings, EXE);
        assert_eq!(
            presenter.present(&event, &choices).unwrap(),
            Presentation::Suppressed
        );
        assert!(launcher.launched.borrow().is_empty());
        assert!(sent.borrow().is_empty());

        let other = interpret(r#"{"event":"approval-requested","thread-id":"t2"}"#).unwrap();
        assert_eq!(
            presenter.present(&other, &choices).unwrap(),
            Presentation::Popup
        );
    }

    #[test]
    fn helper_unavailable_without_notifier_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let launcher = FakeLauncher {
            unavailable: true,
            ..FakeLauncher::default()
        };
        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", false, false), ("osascript", false, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );

        let event = interpret(r#"{"event":"approval-requested","thread-id":"t1"}"#).unwrap();
        let choices = resolve(&event, &settings, EXE);
        let err = presenter.present(&event, &choices).unwrap_err();
        assert!(matches!(err, NotifyError::NoCapabilityAvailable));
    }

    #[test]
    fn helper_unavailable_falls_back_to_chooser_notification() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let launcher = FakeLauncher {
            unavailable: true,
            ..FakeLauncher::default()
        };
        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", false, false), ("macos", true, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );

        let event = interpret(r#"{"event":"approval-requested","thread-id":"t1"}"#).unwrap();
        let choices = resolve(&event, &settings, EXE);
        assert_eq!(
            presenter.present(&event, &choices).unwrap(),
            Presentation::Notified(1)
        );
        let sent = sent.borrow();
        assert_eq!(sent[0].0, "macos");
        assert_eq!(
            sent[0].1.execute_on_click.as_deref(),
            Some("'/opt/bin/codex-notify' action 'choose' --thread-id 't1'")
        );
    }

    #[test]
    fn multi_style_sends_three_notifications() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            approval_ui: ApprovalUi::Multi,
            ..system_ui()
        };
        let launcher = FakeLauncher::default();
        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );

        let event = interpret(r#"{"event":"approval-requested","thread-id":"t1"}"#).unwrap();
        let choices = resolve(&event, &settings, EXE);
        assert_eq!(
            presenter.present(&event, &choices).unwrap(),
            Presentation::Notified(3)
        );
        assert_eq!(sent.borrow().len(), 3);
        assert!(launcher.launched.borrow().is_empty());
    }

    #[test]
    fn popup_mode_renders_plain_notification_as_single_choice_popup() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let launcher = FakeLauncher::default();
        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );

        let event = interpret(r#"{"event":"agent-turn-complete","message":"Done."}"#).unwrap();
        assert_eq!(
            presenter.present(&event, &[]).unwrap(),
            Presentation::Notified(1)
        );
        let launched = launcher.launched.borrow();
        assert_eq!(launched.len(), 1);
        assert_eq!(launched[0].choices[0].0, "Open");
        assert_eq!(launched[0].identifier, "codex-notify-agent-turn-complete");
        assert!(launched[0].lock_file.is_none());
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn failing_providers_fall_through_and_report_last_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = system_ui();
        let launcher = FakeLauncher::default();

        let sent = Sent::default();
        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, true), ("osascript", true, false)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );
        presenter.send(&NotificationRequest::default()).unwrap();
        assert_eq!(sent.borrow()[0].0, "osascript");

        let presenter = Presenter::new(
            &settings,
            &launcher,
            providers(&[("terminal-notifier", true, true), ("osascript", true, true)], &sent),
            LockStore::new(dir.path()),
            EXE,
        );
        let err = presenter.send(&NotificationRequest::default()).unwrap_err();
        assert!(matches!(
            err,
            NotifyError::Provider(ProviderError::Failed {
                provider: "osascript",
                ..
            })
        ));
    }

    #[test]
    fn single_choice_labels() {
        let request = |cmd: Option<&str>, label: Option<&str>| NotificationRequest {
            execute_on_click: cmd.map(str::to_string),
            primary_label: label.map(str::to_string),
            ..NotificationRequest::default()
        };
        assert_eq!(single_choice(&request(None, None)).0, "Close");
        assert_eq!(single_choice(&request(Some("'x' action 'approve'"), None)).0, "Approve");
        assert_eq!(single_choice(&request(Some("'x' action 'reject'"), None)).0, "Reject");
        assert_eq!(single_choice(&request(Some("'x' action 'choose'"), None)).0, "Choose");
        assert_eq!(single_choice(&request(Some("'x' action 'submit'"), None)).0, "Submit");
        assert_eq!(single_choice(&request(Some("'x' action 'open'"), None)).0, "Open");
        assert_eq!(
            single_choice(&request(Some("'x' action 'approve'"), Some("Allow"))),
            ("Allow".to_string(), "'x' action 'approve'".to_string())
        );
    }
}
