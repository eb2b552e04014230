//! Session state module
//!
//! Provides the shared mode flags and the session state machine with three
//! states:
//! - Dormant: waiting for a wake phrase
//! - ActiveBounded: listening until a deadline
//! - ActiveUnbounded: listening until told to sleep

mod flags;
mod machine;

pub use flags::{ModeFlags, SessionState, SharedFlags};
pub use machine::{SessionStateMachine, WakePhrases};
