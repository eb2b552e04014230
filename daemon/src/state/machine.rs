//! Session state machine
//!
//! Handles transitions between Dormant, ActiveBounded and ActiveUnbounded.
//! The current state is always derived from the shared flags, so a sleep or
//! stay-awake command issued through the dispatcher takes effect on the next
//! iteration.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, NaiveDateTime};
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::commands::{CommandDispatcher, Flow};
use crate::events::{SessionEvent, SleepReason, Window};
use crate::providers::UtteranceSource;
use crate::voice::Responder;

use super::{SessionState, SharedFlags};

/// Default bounded listening window
pub const AWAKE_WINDOW_SECS: i64 = 600;

/// Default capture timeout handed to the utterance source
pub const CAPTURE_TIMEOUT: StdDuration = StdDuration::from_secs(8);

const ACTIVE_PROMPT: &str = "I'm in active mode and listening. What can I do for you?";

/// Whether the loop keeps going after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Terminate,
}

/// Phrases recognised while dormant
#[derive(Debug, Clone)]
pub struct WakePhrases {
    bounded: Vec<String>,
    unbounded: Vec<String>,
    goodbye: Vec<String>,
}

impl WakePhrases {
    /// Stock phrases for an assistant called `name`
    pub fn for_name(name: &str) -> Self {
        Self {
            bounded: vec![
                format!("hey {name}"),
                format!("ok {name}"),
                format!("power up {name}"),
                format!("wake up {name}"),
                format!("{name} online"),
            ],
            unbounded: vec![format!("{name} awake"), format!("{name} stay")],
            goodbye: vec![format!("bye {name}"), "goodbye".to_string()],
        }
    }

    fn window_for(&self, heard: &str) -> Option<Window> {
        let contains = |phrases: &[String]| phrases.iter().any(|p| heard.contains(p.as_str()));
        if contains(&self.bounded) {
            Some(Window::Bounded)
        } else if contains(&self.unbounded) {
            Some(Window::Unbounded)
        } else {
            None
        }
    }

    fn is_goodbye(&self, heard: &str) -> bool {
        self.goodbye.iter().any(|p| heard.contains(p.as_str()))
    }
}

/// Drives the listen/act cycle
pub struct SessionStateMachine {
    flags: SharedFlags,
    source: Box<dyn UtteranceSource>,
    dispatcher: CommandDispatcher,
    responder: Responder,
    clock: Arc<dyn Clock>,
    phrases: WakePhrases,
    window: Duration,
    capture_timeout: StdDuration,
    /// Time when the current active window was entered
    entered_at: Option<NaiveDateTime>,
    /// Speak the unbounded prompt before the next capture
    prompt_pending: bool,
    /// Channel for emitting session events
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionStateMachine {
    pub fn new(
        flags: SharedFlags,
        source: Box<dyn UtteranceSource>,
        dispatcher: CommandDispatcher,
        responder: Responder,
        clock: Arc<dyn Clock>,
        event_tx: broadcast::Sender<SessionEvent>,
    ) -> Self {
        Self {
            flags,
            source,
            dispatcher,
            responder,
            clock,
            phrases: WakePhrases::for_name("sky"),
            window: Duration::seconds(AWAKE_WINDOW_SECS),
            capture_timeout: CAPTURE_TIMEOUT,
            entered_at: None,
            prompt_pending: true,
            event_tx,
        }
    }

    pub fn with_phrases(mut self, phrases: WakePhrases) -> Self {
        self.phrases = phrases;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_capture_timeout(mut self, timeout: StdDuration) -> Self {
        self.capture_timeout = timeout;
        self
    }

    /// Get the current state
    pub fn state(&self) -> SessionState {
        self.flags.session_state()
    }

    /// Run until the goodbye command
    pub async fn run(&mut self) {
        info!(state = %self.state(), "session loop started");
        while self.step().await == Step::Continue {}
        info!("session loop stopped");
    }

    /// One iteration: at most one capture, one dispatch and one state check
    pub async fn step(&mut self) -> Step {
        let flags = self.flags.snapshot();
        match flags.session_state() {
            SessionState::Dormant => self.step_dormant().await,
            SessionState::ActiveBounded => {
                // Checked before blocking on capture so an expired window is
                // noticed without waiting for another phrase
                match flags.awake_until {
                    Some(until) if self.clock.now() > until => {
                        self.expire().await;
                        Step::Continue
                    }
                    _ => self.listen_and_dispatch().await,
                }
            }
            SessionState::ActiveUnbounded => {
                // Once per heard phrase, not once per empty capture
                if self.prompt_pending {
                    self.prompt_pending = false;
                    self.responder.say(ACTIVE_PROMPT).await;
                }
                self.listen_and_dispatch().await
            }
        }
    }

    /// Next phrase, trimmed and lowercased
    async fn capture(&mut self) -> String {
        let heard = self.source.next(self.capture_timeout).await;
        heard.trim().to_lowercase()
    }

    async fn step_dormant(&mut self) -> Step {
        let heard = self.capture().await;
        if heard.is_empty() {
            return Step::Continue;
        }

        if self.phrases.is_goodbye(&heard) {
            return self.dispatch(&heard).await;
        }

        match self.phrases.window_for(&heard) {
            Some(Window::Bounded) => {
                let until = self.clock.now() + self.window;
                self.flags.wake_bounded(until);
                self.entered(SessionState::Dormant, Window::Bounded);
                let minutes = self.window.num_minutes();
                self.responder
                    .say(&format!(
                        "I'm awake and listening for the next {minutes} minutes."
                    ))
                    .await;
            }
            Some(Window::Unbounded) => {
                self.flags.wake_unbounded();
                self.entered(SessionState::Dormant, Window::Unbounded);
                self.responder
                    .say("Staying awake until you tell me to sleep.")
                    .await;
            }
            None => debug!(%heard, "ignored while dormant"),
        }
        Step::Continue
    }

    async fn listen_and_dispatch(&mut self) -> Step {
        let heard = self.capture().await;
        if heard.is_empty() {
            return Step::Continue;
        }
        self.dispatch(&heard).await
    }

    async fn dispatch(&mut self, heard: &str) -> Step {
        let before = self.flags.session_state();
        self.prompt_pending = true;
        let outcome = self.dispatcher.dispatch(heard).await;
        self.emit(SessionEvent::Dispatched {
            rule: outcome.rule.to_string(),
        });

        if outcome.flow == Flow::Terminate {
            if before != SessionState::Dormant {
                self.log_transition(before, SessionState::Dormant);
            }
            self.emit(SessionEvent::Terminated);
            return Step::Terminate;
        }

        let after = self.flags.session_state();
        if after != before {
            self.log_transition(before, after);
            match after {
                SessionState::Dormant => {
                    self.entered_at = None;
                    self.emit(SessionEvent::WentDormant {
                        reason: SleepReason::Command,
                    });
                }
                SessionState::ActiveUnbounded => self.entered(before, Window::Unbounded),
                SessionState::ActiveBounded => self.entered(before, Window::Bounded),
            }
        }
        Step::Continue
    }

    async fn expire(&mut self) {
        self.flags.sleep();
        self.log_transition(SessionState::ActiveBounded, SessionState::Dormant);
        self.entered_at = None;
        self.emit(SessionEvent::WentDormant {
            reason: SleepReason::Timeout,
        });
        let minutes = self.window.num_minutes();
        self.responder
            .say(&format!(
                "{minutes} minutes have passed. Going back to sleep."
            ))
            .await;
    }

    fn entered(&mut self, from: SessionState, window: Window) {
        let to = match window {
            Window::Bounded => SessionState::ActiveBounded,
            Window::Unbounded => SessionState::ActiveUnbounded,
        };
        if from == SessionState::Dormant {
            self.log_transition(from, to);
        }
        self.entered_at = Some(self.clock.now());
        self.prompt_pending = true;
        self.emit(SessionEvent::Woke { window });
    }

    fn log_transition(&self, from: SessionState, to: SessionState) {
        let active_secs = self
            .entered_at
            .map(|t| (self.clock.now() - t).num_seconds())
            .unwrap_or(0);
        info!(
            from = %from,
            to = %to,
            active_secs,
            "session transition"
        );
    }

    fn emit(&self, event: SessionEvent) {
        debug!(%event, "emitting session event");
        let _ = self.event_tx.send(event);
    }
}
