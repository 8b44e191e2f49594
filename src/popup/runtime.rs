//! Single-threaded event loop of the popup helper.

use super::PopupSpec;
use super::machine::{Effect, Outcome, PopupEvent, PopupMachine};
use super::surface::{Surface, SurfaceEvent};
use crate::lock::InteractionLock;
use crossbeam_channel::{after, select, tick, unbounded};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub trait CommandRunner {
    fn run(&mut self, command: &str);
}

/// Runs continuation commands through `sh -c` and waits for them.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) {
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(status) if status.success() => debug!("choice command finished"),
            Ok(status) => warn!(%status, "choice command exited unsuccessfully"),
            Err(err) => warn!(%err, "failed to run choice command"),
        }
    }
}

pub fn run_popup<S, R>(
    spec: &PopupSpec,
    surface: &mut S,
    runner: &mut R,
    lock: Option<InteractionLock>,
    tick_interval: Duration,
) -> Outcome
where
    S: Surface,
    R: CommandRunner,
{
    let mut lock = lock;
    let commands = spec.choices.iter().map(|c| c.command.clone()).collect();
    let mut machine = PopupMachine::new(commands, spec.timeout);
    let (tx, rx) = unbounded();

    let opened = surface.open(&spec.view(), tx);
    let started = Instant::now();
    let deadline = after(spec.timeout);
    let ticker = tick(tick_interval);

    if let Err(err) = opened {
        warn!(%err, "popup surface failed to open");
        apply(machine.handle(PopupEvent::Dismiss), surface, runner, &mut lock);
    }

    while !machine.is_terminated() {
        let event = select! {
            recv(rx) -> msg => match msg {
                Ok(SurfaceEvent::Shown) => PopupEvent::Shown,
                Ok(SurfaceEvent::Chose(idx)) => PopupEvent::Chose(idx),
                Ok(SurfaceEvent::Dismissed) => PopupEvent::Dismiss,
                Ok(SurfaceEvent::TimedOut) => PopupEvent::Elapsed,
                Ok(SurfaceEvent::Failed(reason)) => {
                    warn!(%reason, "popup surface failed");
                    PopupEvent::Dismiss
                }
                Err(_) => PopupEvent::Dismiss,
            },
            recv(deadline) -> _ => PopupEvent::Elapsed,
            recv(ticker) -> _ => PopupEvent::Tick(spec.timeout.saturating_sub(started.elapsed())),
        };

        apply(machine.handle(event), surface, runner, &mut lock);
        debug!(?event, state = ?machine.state(), "popup event");
        if let PopupEvent::Tick(_) = event {
            surface.update_countdown(machine.remaining(), machine.progress());
        }
    }

    let outcome = machine.outcome().unwrap_or(Outcome::Dismissed);
    info!(identifier = %spec.identifier, ?outcome, trail = ?machine.trail(), "popup closed");
    outcome
}

fn apply<S: Surface, R: CommandRunner>(
    effects: Vec<Effect>,
    surface: &mut S,
    runner: &mut R,
    lock: &mut Option<InteractionLock>,
) {
    for effect in effects {
        match effect {
            Effect::Execute(command) => {
                surface.close();
                runner.run(&command);
            }
            Effect::ReleaseLock => {
                if let Some(lock) = lock.as_mut() {
                    lock.release();
                }
            }
            Effect::Exit => surface.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::popup::surface::PopupView;
    use crate::popup::{PopupArgs, PopupSpec};
    use crossbeam_channel::Sender;

    #[derive(Default)]
    struct FakeSurface {
        script: Vec<SurfaceEvent>,
        fail_open: bool,
        opened: Option<PopupView>,
        closes: usize,
        countdowns: usize,
        // Keeps the channel open for surfaces that never answer.
        held: Option<Sender<SurfaceEvent>>,
    }

    impl Surface for FakeSurface {
        fn open(&mut self, view: &PopupView, events: Sender<SurfaceEvent>) -> Result<(), NotifyError> {
            if self.fail_open {
                return Err(NotifyError::HelperUnavailable("no display".into()));
            }
            self.opened = Some(view.clone());
            events.send(SurfaceEvent::Shown).unwrap();
            for event in self.script.drain(..) {
                events.send(event).unwrap();
            }
            self.held = Some(events);
            Ok(())
        }

        fn update_countdown(&mut self, _remaining: Duration, _progress: f64) {
            self.countdowns += 1;
        }

        fn close(&mut self) {
            self.closes += 1;
        }
    }

    #[derive(Default)]
    struct RecordingRunner {
        commands: Vec<String>,
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, command: &str) {
            self.commands.push(command.to_string());
        }
    }

    fn spec(timeout: Duration) -> PopupSpec {
        let args = PopupArgs {
            title: "Codex".into(),
            message: "approve?".into(),
            identifier: "codex-notify-approval-native-t1".into(),
            choice_label: vec!["Yes".into(), "No".into()],
            choice_cmd: vec!["run-yes".into(), "run-no".into()],
            ..PopupArgs::default()
        };
        let mut spec = PopupSpec::from_args(&args);
        spec.timeout = timeout;
        spec
    }

    #[test]
    fn user_choice_runs_exactly_one_command_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("g.lock");
        let lock = InteractionLock::acquire(&lock_path).unwrap();

        let mut surface = FakeSurface {
            script: vec![
                SurfaceEvent::Chose(1),
                SurfaceEvent::Chose(0),
                SurfaceEvent::Dismissed,
            ],
            ..FakeSurface::default()
        };
        let mut runner = RecordingRunner::default();
        let outcome = run_popup(
            &spec(Duration::from_secs(30)),
            &mut surface,
            &mut runner,
            Some(lock),
            TICK_INTERVAL,
        );

        assert_eq!(outcome, Outcome::Chose(1));
        assert_eq!(runner.commands, vec!["run-no"]);
        assert!(!lock_path.exists());
        assert!(surface.closes >= 1);
        assert_eq!(surface.opened.unwrap().choices.len(), 2);
    }

    #[test]
    fn timeout_runs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("g.lock");
        let lock = InteractionLock::acquire(&lock_path).unwrap();

        let mut surface = FakeSurface::default();
        let mut runner = RecordingRunner::default();
        let outcome = run_popup(
            &spec(Duration::from_millis(120)),
            &mut surface,
            &mut runner,
            Some(lock),
            Duration::from_millis(20),
        );

        assert_eq!(outcome, Outcome::TimedOut);
        assert!(runner.commands.is_empty());
        assert!(!lock_path.exists());
        assert!(surface.countdowns >= 1);
    }

    #[test]
    fn dismiss_runs_nothing() {
        let mut surface = FakeSurface {
            script: vec![SurfaceEvent::Dismissed, SurfaceEvent::Chose(0)],
            ..FakeSurface::default()
        };
        let mut runner = RecordingRunner::default();
        let outcome = run_popup(
            &spec(Duration::from_secs(30)),
            &mut surface,
            &mut runner,
            None,
            TICK_INTERVAL,
        );
        assert_eq!(outcome, Outcome::Dismissed);
        assert!(runner.commands.is_empty());
    }

    #[test]
    fn surface_failure_closes_without_running() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("g.lock");
        let lock = InteractionLock::acquire(&lock_path).unwrap();

        let mut surface = FakeSurface {
            fail_open: true,
            ..FakeSurface::default()
        };
        let mut runner = RecordingRunner::default();
        let outcome = run_popup(
            &spec(Duration::from_secs(30)),
            &mut surface,
            &mut runner,
            Some(lock),
            TICK_INTERVAL,
        );
        assert_eq!(outcome, Outcome::Dismissed);
        assert!(runner.commands.is_empty());
        assert!(!lock_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn shell_runner_executes_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        ShellRunner.run(&format!("echo once >> '{}'", marker.display()));
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "once\n");
    }
}
