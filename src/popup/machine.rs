//! Display-independent state machine of the popup helper.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Idle,
    Displaying,
    UserChose(usize),
    TimedOut,
    Dismissed,
    Closing,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupEvent {
    /// The surface is on screen.
    Shown,
    /// Countdown progress; carries the time left.
    Tick(Duration),
    /// The user activated the choice at this index.
    Chose(usize),
    /// The countdown ran out.
    Elapsed,
    /// The user closed the popup without choosing.
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Chose(usize),
    TimedOut,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run this shell command once and ignore its output.
    Execute(String),
    ReleaseLock,
    Exit,
}

#[derive(Debug)]
pub struct PopupMachine {
    state: PopupState,
    commands: Vec<String>,
    timeout: Duration,
    remaining: Duration,
    outcome: Option<Outcome>,
    trail: Vec<PopupState>,
}

impl PopupMachine {
    pub fn new(commands: Vec<String>, timeout: Duration) -> Self {
        Self {
            state: PopupState::Idle,
            commands,
            timeout,
            remaining: timeout,
            outcome: None,
            trail: vec![PopupState::Idle],
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// Fraction of the countdown still left, from 1.0 down to 0.0.
    pub fn progress(&self) -> f64 {
        if self.timeout.is_zero() {
            return 0.0;
        }
        self.remaining.as_secs_f64() / self.timeout.as_secs_f64()
    }

    /// Every state visited so far, in order.
    pub fn trail(&self) -> &[PopupState] {
        &self.trail
    }

    pub fn is_terminated(&self) -> bool {
        self.state == PopupState::Terminated
    }

    pub fn handle(&mut self, event: PopupEvent) -> Vec<Effect> {
        match (self.state, event) {
            (PopupState::Idle, PopupEvent::Shown) => {
                self.enter(PopupState::Displaying);
                Vec::new()
            }
            (PopupState::Displaying, PopupEvent::Tick(left)) => {
                self.remaining = left.min(self.timeout);
                Vec::new()
            }
            (PopupState::Displaying, PopupEvent::Chose(idx)) if idx < self.commands.len() => {
                self.finish(Outcome::Chose(idx))
            }
            (PopupState::Idle | PopupState::Displaying, PopupEvent::Elapsed) => {
                self.finish(Outcome::TimedOut)
            }
            (PopupState::Idle | PopupState::Displaying, PopupEvent::Dismiss) => {
                self.finish(Outcome::Dismissed)
            }
            _ => Vec::new(),
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Vec<Effect> {
        self.outcome = Some(outcome);
        let mut effects = Vec::new();
        match outcome {
            Outcome::Chose(idx) => {
                self.enter(PopupState::UserChose(idx));
                let command = self.commands[idx].trim();
                if !command.is_empty() {
                    effects.push(Effect::Execute(command.to_string()));
                }
            }
            Outcome::TimedOut => {
                self.remaining = Duration::ZERO;
                self.enter(PopupState::TimedOut);
            }
            Outcome::Dismissed => self.enter(PopupState::Dismissed),
        }
        self.enter(PopupState::Closing);
        effects.push(Effect::ReleaseLock);
        self.enter(PopupState::Terminated);
        effects.push(Effect::Exit);
        effects
    }

    fn enter(&mut self, state: PopupState) {
        self.state = state;
        self.trail.push(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> PopupMachine {
        PopupMachine::new(
            vec!["cmd-open".into(), String::new(), "cmd-reject".into()],
            Duration::from_secs(45),
        )
    }

    #[test]
    fn choice_executes_once_then_closes() {
        let mut m = machine();
        assert!(m.handle(PopupEvent::Shown).is_empty());
        let effects = m.handle(PopupEvent::Chose(2));
        assert_eq!(
            effects,
            vec![
                Effect::Execute("cmd-reject".into()),
                Effect::ReleaseLock,
                Effect::Exit
            ]
        );
        assert_eq!(m.outcome(), Some(Outcome::Chose(2)));
        assert_eq!(
            m.trail(),
            &[
                PopupState::Idle,
                PopupState::Displaying,
                PopupState::UserChose(2),
                PopupState::Closing,
                PopupState::Terminated
            ]
        );
    }

    #[test]
    fn events_after_outcome_are_ignored() {
        let mut m = machine();
        m.handle(PopupEvent::Shown);
        m.handle(PopupEvent::Chose(0));
        assert!(m.handle(PopupEvent::Chose(2)).is_empty());
        assert!(m.handle(PopupEvent::Elapsed).is_empty());
        assert!(m.handle(PopupEvent::Dismiss).is_empty());
        assert_eq!(m.outcome(), Some(Outcome::Chose(0)));
        assert!(m.is_terminated());
    }

    #[test]
    fn empty_command_choice_executes_nothing() {
        let mut m = machine();
        m.handle(PopupEvent::Shown);
        assert_eq!(
            m.handle(PopupEvent::Chose(1)),
            vec![Effect::ReleaseLock, Effect::Exit]
        );
    }

    #[test]
    fn timeout_and_dismiss_execute_nothing() {
        let mut m = machine();
        m.handle(PopupEvent::Shown);
        assert_eq!(
            m.handle(PopupEvent::Elapsed),
            vec![Effect::ReleaseLock, Effect::Exit]
        );
        assert_eq!(m.outcome(), Some(Outcome::TimedOut));
        assert_eq!(m.remaining(), Duration::ZERO);

        let mut m = machine();
        m.handle(PopupEvent::Shown);
        assert_eq!(
            m.handle(PopupEvent::Dismiss),
            vec![Effect::ReleaseLock, Effect::Exit]
        );
        assert_eq!(m.outcome(), Some(Outcome::Dismissed));
    }

    #[test]
    fn choice_before_display_or_out_of_range_is_ignored() {
        let mut m = machine();
        assert!(m.handle(PopupEvent::Chose(0)).is_empty());
        assert_eq!(m.state(), PopupState::Idle);
        m.handle(PopupEvent::Shown);
        assert!(m.handle(PopupEvent::Chose(9)).is_empty());
        assert_eq!(m.state(), PopupState::Displaying);
    }

    #[test]
    fn ticks_drive_progress() {
        let mut m = machine();
        m.handle(PopupEvent::Shown);
        assert_eq!(m.progress(), 1.0);
        m.handle(PopupEvent::Tick(Duration::from_secs(9)));
        assert!((m.progress() - 0.2).abs() < 1e-9);
    }
}
