//! Events module for session transitions and proactive jobs
//!
//! Provides structured event types published on a broadcast channel by the
//! session state machine and the notification scheduler.

use serde::{Deserialize, Serialize};

/// Which listening window the session entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Window {
    /// Ends at a deadline
    Bounded,
    /// Ends on an explicit sleep command
    Unbounded,
}

/// Why the session went back to sleep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepReason {
    /// The bounded window expired
    Timeout,
    /// A sleep command cleared the flags
    Command,
}

/// What a fired proactive job ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Notifications were disabled, nothing was fetched or said
    Suppressed,
    /// The job ran but had nothing to say (or its provider failed)
    Nothing,
    /// The job spoke to the user
    Spoken,
}

/// Events emitted by the session loop and the scheduler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A wake phrase was heard while dormant
    Woke { window: Window },

    /// The session returned to dormancy
    WentDormant { reason: SleepReason },

    /// An utterance was handed to the dispatcher
    Dispatched {
        /// Name of the rule that matched, `fallback` when none did
        rule: String,
    },

    /// The goodbye command ended the session
    Terminated,

    /// A proactive job reached its fire time
    JobFired {
        job: String,
        outcome: Delivery,
    },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::Woke { window: Window::Bounded } => write!(f, "WOKE_BOUNDED"),
            SessionEvent::Woke { window: Window::Unbounded } => write!(f, "WOKE_UNBOUNDED"),
            SessionEvent::WentDormant { reason } => write!(f, "WENT_DORMANT ({:?})", reason),
            SessionEvent::Dispatched { rule } => write!(f, "DISPATCHED ({})", rule),
            SessionEvent::Terminated => write!(f, "TERMINATED"),
            SessionEvent::JobFired { job, outcome } => {
                write!(f, "JOB_FIRED ({}, {:?})", job, outcome)
            }
        }
    }
}
