//! Shared mode flags
//!
//! A single [`ModeFlags`] record is shared between the session loop, the
//! command dispatcher and the notification scheduler through a cloneable
//! [`SharedFlags`] handle. Wake and sleep transitions rewrite `stay_awake`
//! and `awake_until` under one write lock.

use std::sync::Arc;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::Serialize;

/// Listening state of the session, derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Not listening, waiting for a wake phrase
    #[default]
    Dormant,
    /// Listening until `awake_until`
    ActiveBounded,
    /// Listening until told to sleep
    ActiveUnbounded,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Dormant => write!(f, "Dormant"),
            SessionState::ActiveBounded => write!(f, "ActiveBounded"),
            SessionState::ActiveUnbounded => write!(f, "ActiveUnbounded"),
        }
    }
}

/// Process-wide toggles and session timing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModeFlags {
    /// Suppress audio playback of responses
    pub silent: bool,
    /// Suppress the textual echo of responses
    pub voice_only: bool,
    /// Gate for every proactive job
    pub notifications_enabled: bool,
    /// Listen until an explicit sleep command
    pub stay_awake: bool,
    /// Deadline of a bounded listening window
    pub awake_until: Option<NaiveDateTime>,
}

impl ModeFlags {
    pub fn session_state(&self) -> SessionState {
        if self.stay_awake {
            SessionState::ActiveUnbounded
        } else if self.awake_until.is_some() {
            SessionState::ActiveBounded
        } else {
            SessionState::Dormant
        }
    }
}

/// Cloneable handle to the shared [`ModeFlags`]
#[derive(Debug, Clone, Default)]
pub struct SharedFlags {
    inner: Arc<RwLock<ModeFlags>>,
}

impl SharedFlags {
    pub fn new(initial: ModeFlags) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Consistent copy of every field
    pub fn snapshot(&self) -> ModeFlags {
        *self.inner.read()
    }

    pub fn session_state(&self) -> SessionState {
        self.inner.read().session_state()
    }

    pub fn silent(&self) -> bool {
        self.inner.read().silent
    }

    pub fn voice_only(&self) -> bool {
        self.inner.read().voice_only
    }

    pub fn notifications_enabled(&self) -> bool {
        self.inner.read().notifications_enabled
    }

    pub fn awake_until(&self) -> Option<NaiveDateTime> {
        self.inner.read().awake_until
    }

    pub fn set_silent(&self, on: bool) {
        self.inner.write().silent = on;
    }

    pub fn set_voice_only(&self, on: bool) {
        self.inner.write().voice_only = on;
    }

    pub fn set_notifications_enabled(&self, on: bool) {
        self.inner.write().notifications_enabled = on;
    }

    /// Enter the bounded listening window ending at `until`
    pub fn wake_bounded(&self, until: NaiveDateTime) {
        let mut flags = self.inner.write();
        flags.stay_awake = false;
        flags.awake_until = Some(until);
    }

    /// Enter the unbounded listening window
    pub fn wake_unbounded(&self) {
        let mut flags = self.inner.write();
        flags.stay_awake = true;
        flags.awake_until = None;
    }

    /// Return to dormancy
    pub fn sleep(&self) {
        let mut flags = self.inner.write();
        flags.stay_awake = false;
        flags.awake_until = None;
    }
}
